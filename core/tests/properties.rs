//! Property-based recovery tests using proptest.

use beagle_core::{search, Capture, CrcModel, GroupStatus, OutputOrder, Reflection, SearchRequest};
use proptest::prelude::*;

fn reflection() -> impl Strategy<Value = Reflection> {
    prop::sample::select(Reflection::ALL.to_vec())
}

fn model() -> impl Strategy<Value = CrcModel> {
    (0u64..128, any::<u8>(), reflection(), any::<u8>()).prop_map(
        |(index, init, reflection, xor_out)| CrcModel {
            width: 8,
            polynomial: (index << 1) | 1,
            init: u64::from(init),
            reflection,
            xor_out: u64::from(xor_out),
        },
    )
}

fn payloads() -> impl Strategy<Value = Vec<Vec<u8>>> {
    (1usize..12).prop_flat_map(|len| prop::collection::vec(prop::collection::vec(any::<u8>(), len), 2..6))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// The generating parameters always survive the sweep.
    #[test]
    fn true_parameters_are_never_rejected(truth in model(), payloads in payloads()) {
        let captures: Vec<Capture> = payloads
            .iter()
            .map(|p| Capture::new(p.clone(), vec![truth.compute(p) as u8]))
            .collect();
        let report = search(&SearchRequest::from_captures(captures.clone())).unwrap();
        let group = &report.groups[0];

        // Random payloads can collide and collapse below two captures.
        prop_assume!(group.status != GroupStatus::InsufficientData);

        prop_assert!(group.status.candidates().iter().any(|c| {
            c.polynomial == truth.polynomial
                && c.reflection == truth.reflection
                && c.output_order == OutputOrder::BigEndian
        }), "{:?}", group.status);

        if let Some(model) = group.model() {
            for capture in &captures {
                prop_assert_eq!(model.compute(capture.payload()), u64::from(capture.output()[0]));
            }
        }
    }

    /// A unique solution is the generating CRC, with init and XOR-out
    /// folded into its CRC of an all-zero payload.
    #[test]
    fn solved_xor_out_folds_init(truth in model(), payloads in payloads()) {
        let captures: Vec<Capture> = payloads
            .iter()
            .map(|p| Capture::new(p.clone(), vec![truth.compute(p) as u8]))
            .collect();
        let report = search(&SearchRequest::from_captures(captures)).unwrap();
        let group = &report.groups[0];

        if let GroupStatus::Solved { candidate, xor_out } = group.status {
            prop_assert_eq!(candidate.polynomial, truth.polynomial);
            prop_assert_eq!(candidate.reflection, truth.reflection);
            prop_assert_eq!(xor_out, truth.compute(&vec![0u8; group.length]));
        }
    }
}
