//! Well-known CRC definitions.
//!
//! Parameters and check values come from the `crc_catalog` crate. Two uses:
//!
//! - naming: differential recovery finds width, polynomial and reflection
//!   but folds init and XOR-out into one per-length constant, so a candidate
//!   maps to a family of named algorithms; [`lookup`] returns that family
//! - a fast path: [`candidates`] tests only the catalog polynomials of a
//!   width against a group's pairs, which is instant where a full sweep of a
//!   32-bit width is not

use crate::capture::OutputOrder;
use crate::crc::{CrcModel, Reflection};
use crate::pairs::PairSet;
use crate::search::CandidateParameters;

/// A named CRC algorithm with its check value (CRC of `"123456789"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Algorithm {
    /// Conventional name.
    pub name: &'static str,
    /// Full parameter set.
    pub model: CrcModel,
    /// CRC of the ASCII string `"123456789"`.
    pub check: u64,
}

/// Convert `crc_catalog` constants, whatever their register type.
macro_rules! known {
    ($($name:literal => $constant:ident),* $(,)?) => {
        &[$(
            Algorithm {
                name: $name,
                model: CrcModel {
                    width: crc_catalog::$constant.width as u32,
                    polynomial: crc_catalog::$constant.poly as u64,
                    init: crc_catalog::$constant.init as u64,
                    reflection: Reflection::new(
                        crc_catalog::$constant.refin,
                        crc_catalog::$constant.refout,
                    ),
                    xor_out: crc_catalog::$constant.xorout as u64,
                },
                check: crc_catalog::$constant.check as u64,
            },
        )*]
    };
}

/// Known algorithms, ordered by width.
pub const CATALOG: &[Algorithm] = known![
    "CRC-3/GSM" => CRC_3_GSM,
    "CRC-3/ROHC" => CRC_3_ROHC,
    "CRC-4/G-704" => CRC_4_G_704,
    "CRC-4/INTERLAKEN" => CRC_4_INTERLAKEN,
    "CRC-5/EPC-C1G2" => CRC_5_EPC_C1G2,
    "CRC-5/G-704" => CRC_5_G_704,
    "CRC-5/USB" => CRC_5_USB,
    "CRC-6/DARC" => CRC_6_DARC,
    "CRC-6/G-704" => CRC_6_G_704,
    "CRC-7/MMC" => CRC_7_MMC,
    "CRC-7/ROHC" => CRC_7_ROHC,
    "CRC-7/UMTS" => CRC_7_UMTS,
    "CRC-8/AUTOSAR" => CRC_8_AUTOSAR,
    "CRC-8/BLUETOOTH" => CRC_8_BLUETOOTH,
    "CRC-8/CDMA2000" => CRC_8_CDMA2000,
    "CRC-8/DARC" => CRC_8_DARC,
    "CRC-8/DVB-S2" => CRC_8_DVB_S2,
    "CRC-8/GSM-A" => CRC_8_GSM_A,
    "CRC-8/GSM-B" => CRC_8_GSM_B,
    "CRC-8/I-432-1" => CRC_8_I_432_1,
    "CRC-8/LTE" => CRC_8_LTE,
    "CRC-8/MAXIM-DOW" => CRC_8_MAXIM_DOW,
    "CRC-8/NRSC-5" => CRC_8_NRSC_5,
    "CRC-8/OPENSAFETY" => CRC_8_OPENSAFETY,
    "CRC-8/ROHC" => CRC_8_ROHC,
    "CRC-8/SAE-J1850" => CRC_8_SAE_J1850,
    "CRC-8/SMBUS" => CRC_8_SMBUS,
    "CRC-8/WCDMA" => CRC_8_WCDMA,
    "CRC-10/ATM" => CRC_10_ATM,
    "CRC-11/FLEXRAY" => CRC_11_FLEXRAY,
    "CRC-12/DECT" => CRC_12_DECT,
    "CRC-12/UMTS" => CRC_12_UMTS,
    "CRC-15/CAN" => CRC_15_CAN,
    "CRC-16/ARC" => CRC_16_ARC,
    "CRC-16/CDMA2000" => CRC_16_CDMA2000,
    "CRC-16/DECT-R" => CRC_16_DECT_R,
    "CRC-16/DNP" => CRC_16_DNP,
    "CRC-16/EN-13757" => CRC_16_EN_13757,
    "CRC-16/GENIBUS" => CRC_16_GENIBUS,
    "CRC-16/GSM" => CRC_16_GSM,
    "CRC-16/IBM-3740" => CRC_16_IBM_3740,
    "CRC-16/IBM-SDLC" => CRC_16_IBM_SDLC,
    "CRC-16/KERMIT" => CRC_16_KERMIT,
    "CRC-16/MAXIM-DOW" => CRC_16_MAXIM_DOW,
    "CRC-16/MCRF4XX" => CRC_16_MCRF4XX,
    "CRC-16/MODBUS" => CRC_16_MODBUS,
    "CRC-16/T10-DIF" => CRC_16_T10_DIF,
    "CRC-16/UMTS" => CRC_16_UMTS,
    "CRC-16/USB" => CRC_16_USB,
    "CRC-16/XMODEM" => CRC_16_XMODEM,
    "CRC-24/BLE" => CRC_24_BLE,
    "CRC-24/OPENPGP" => CRC_24_OPENPGP,
    "CRC-32/AIXM" => CRC_32_AIXM,
    "CRC-32/AUTOSAR" => CRC_32_AUTOSAR,
    "CRC-32/BZIP2" => CRC_32_BZIP2,
    "CRC-32/CD-ROM-EDC" => CRC_32_CD_ROM_EDC,
    "CRC-32/CKSUM" => CRC_32_CKSUM,
    "CRC-32/ISCSI" => CRC_32_ISCSI,
    "CRC-32/ISO-HDLC" => CRC_32_ISO_HDLC,
    "CRC-32/JAMCRC" => CRC_32_JAMCRC,
    "CRC-32/MPEG-2" => CRC_32_MPEG_2,
    "CRC-32/XFER" => CRC_32_XFER,
    "CRC-40/GSM" => CRC_40_GSM,
    "CRC-64/ECMA-182" => CRC_64_ECMA_182,
    "CRC-64/GO-ISO" => CRC_64_GO_ISO,
    "CRC-64/WE" => CRC_64_WE,
    "CRC-64/XZ" => CRC_64_XZ,
];

/// Named algorithms sharing a candidate's width, polynomial and reflection.
pub fn lookup(candidate: &CandidateParameters) -> impl Iterator<Item = &'static Algorithm> + '_ {
    CATALOG.iter().filter(move |a| {
        a.model.width == candidate.width
            && a.model.polynomial == candidate.polynomial
            && a.model.reflection == candidate.reflection
    })
}

/// Catalog (polynomial, reflection) choices of `width` that explain every
/// pair, for each byte order in `orders`.
///
/// Sorted and unique. Algorithms differing only in init or XOR-out collapse
/// into one candidate.
pub fn candidates(
    pairs: &PairSet,
    orders: &[OutputOrder],
    width: u32,
) -> Vec<CandidateParameters> {
    let mut found: Vec<CandidateParameters> = orders
        .iter()
        .flat_map(|&output_order| {
            CATALOG
                .iter()
                .filter(move |a| a.model.width == width)
                .map(move |a| CandidateParameters {
                    width,
                    polynomial: a.model.polynomial,
                    reflection: a.model.reflection,
                    output_order,
                })
        })
        .collect();
    found.sort_unstable();
    found.dedup();
    found.retain(|c| c.satisfies(pairs));
    found
}
