//! End-to-end runs over CSV inventories.

use canopy::dataset::{load_csv, read_records, write_curves, write_records};
use canopy::{
    AgglomerativePartitioner, Analysis, CandidateRange, ClusterAssigner, DensityPartitioner,
    Error, Evaluator, FeatureMatrix, FeatureSelector, FixedCount, Partitioner, Record, Selector,
    NOISE,
};
use proptest::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Three stands: short trees in the west, tall in the east, medium up north.
fn inventory_csv() -> String {
    let mut csv = String::from("haut_tot,tronc_diam,longitude,latitude\n");
    for i in 0..5 {
        let d = i as f64 * 0.002;
        csv.push_str(&format!("{},{},{},{}\n", 4.0 + d, 15.0, 3.10 + d, 49.10));
        csv.push_str(&format!("{},{},{},{}\n", 22.0 + d, 70.0, 3.60 + d, 49.12));
        csv.push_str(&format!("{},{},{},{}\n", 12.0 + d, 40.0, 3.35 + d, 49.60));
    }
    csv
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn csv_to_assignment() {
    let file = write_temp(&inventory_csv());
    let mut records = load_csv(file.path()).unwrap();
    assert_eq!(records.len(), 15);

    let outcome = Analysis::default()
        .run(&records, &mut FixedCount(3))
        .unwrap();

    assert_eq!(outcome.evaluations.iter().map(|e| e.k).collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    assert_eq!(outcome.recommended.silhouette, 3);
    assert_eq!(outcome.recommended.davies_bouldin, 3);

    let labels = outcome.assignment.labels();
    for (i, &l) in labels.iter().enumerate() {
        assert_eq!(l, labels[i % 3], "record {i} left its stand");
    }
    assert_eq!(outcome.assignment.groups().len(), 3);

    outcome.assignment.apply(&mut records).unwrap();
    let mut out = Vec::new();
    write_records(&mut out, &records).unwrap();
    let reread = read_records(out.as_slice()).unwrap();
    assert_eq!(reread.len(), 15);
    assert!(reread.iter().all(|r| r.cluster.is_some()));
}

#[test]
fn fixed_three_cluster_run_on_diameter_height() {
    let records = read_records(inventory_csv().as_bytes()).unwrap();
    let data = FeatureSelector::diameter_height().select(&records).unwrap();
    assert_eq!(data.row(1).to_vec(), vec![70.0, 22.0]);

    let a = ClusterAssigner::default().with_k(3).partition(&data).unwrap();
    let labels = a.labels();
    for (i, &l) in labels.iter().enumerate() {
        assert_eq!(l, labels[i % 3], "record {i}");
    }
    assert_eq!(a.groups().len(), 3);
}

#[test]
fn outcome_curves_follow_the_sweep() {
    let records = read_records(inventory_csv().as_bytes()).unwrap();
    let outcome = Analysis::default().run(&records, &mut FixedCount(2)).unwrap();
    let curves = outcome.curves();
    let ks: Vec<usize> = curves.davies_bouldin.iter().map(|&(k, _)| k).collect();
    assert_eq!(ks, vec![2, 3, 4, 5]);
    assert_eq!(curves.silhouette.len(), 4);
    assert_eq!(curves.inertia[0], (2, outcome.evaluations[0].inertia));
}

#[test]
fn evaluation_properties() {
    let records = read_records(inventory_csv().as_bytes()).unwrap();
    let data = FeatureSelector::height_geo().select(&records).unwrap();
    let evals = Evaluator::default()
        .evaluate(&data, &CandidateRange::default())
        .unwrap();

    for e in &evals {
        assert!(e.inertia >= 0.0);
        assert!(e.davies_bouldin >= 0.0);
        assert!((-1.0..=1.0).contains(&e.silhouette));
    }
    // Separating the third stand removes almost all of the spread.
    assert!(evals[1].inertia < evals[0].inertia * 1e-3);

    let optimal = Selector::default().select(&evals).unwrap();
    for k in [optimal.elbow, optimal.davies_bouldin, optimal.silhouette] {
        assert!((2..=5).contains(&k));
    }
    // Largest inertia sits at the smallest candidate.
    assert_eq!(optimal.elbow, 2);

    let mut curves = Vec::new();
    write_curves(&mut curves, &evals).unwrap();
    let text = String::from_utf8(curves).unwrap();
    assert_eq!(text.lines().count(), 5);
}

#[test]
fn repeated_runs_are_identical() {
    let records = read_records(inventory_csv().as_bytes()).unwrap();
    let a = Analysis::default().run(&records, &mut FixedCount(4)).unwrap();
    let b = Analysis::default().run(&records, &mut FixedCount(4)).unwrap();

    assert_eq!(a.assignment, b.assignment);
    assert_eq!(a.recommended, b.recommended);
    for (x, y) in a.evaluations.iter().zip(&b.evaluations) {
        assert_eq!(x.inertia.to_bits(), y.inertia.to_bits());
        assert_eq!(x.silhouette.to_bits(), y.silhouette.to_bits());
    }
}

#[test]
fn missing_diameter_column_is_rejected() {
    let file = write_temp("haut_tot,longitude,latitude\n5.0,3.1,49.1\n");
    let err = load_csv(file.path()).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "tronc_diam"));
}

#[test]
fn too_few_records_for_the_sweep() {
    let records = vec![
        Record::new(1.0, 1.0).with_position(3.0, 49.0),
        Record::new(2.0, 1.0).with_position(3.1, 49.0),
        Record::new(3.0, 1.0).with_position(3.2, 49.0),
    ];
    let err = Analysis::default().recommend(&records).unwrap_err();
    assert!(matches!(err, Error::InvalidCandidateRange { .. }));
}

#[test]
fn alternative_partitioners() {
    let records = read_records(inventory_csv().as_bytes()).unwrap();
    let data = FeatureSelector::height_diameter().select(&records).unwrap();

    let partitioners: Vec<Box<dyn Partitioner>> = vec![
        Box::new(ClusterAssigner::default().with_k(3)),
        Box::new(AgglomerativePartitioner::default()),
        Box::new(DensityPartitioner {
            eps: 0.5,
            min_samples: 3,
        }),
    ];

    for p in &partitioners {
        let a = p.partition(&data).unwrap();
        assert_eq!(a.len(), records.len(), "{}", p.name());
        assert_eq!(a.n_clusters(), 3, "{}", p.name());
        assert_eq!(a.n_noise(), 0, "{}", p.name());
        let labels = a.labels();
        for (i, &l) in labels.iter().enumerate() {
            assert_eq!(l, labels[i % 3], "{}: record {i}", p.name());
        }
    }

    let sparse = DensityPartitioner {
        eps: 0.5,
        min_samples: 6,
    }
    .partition(&data)
    .unwrap();
    assert!(sparse.labels().iter().all(|&l| l == NOISE));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn assignment_covers_every_row(
        rows in prop::collection::vec(prop::array::uniform2(-50.0f64..50.0), 6..30),
        k in 1usize..6,
    ) {
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        let data = FeatureMatrix::from_rows(
            FeatureSelector::height_diameter().columns().to_vec(),
            &rows,
        )
        .unwrap();
        let a = ClusterAssigner::default().assign(&data, k).unwrap();
        prop_assert_eq!(a.len(), rows.len());
        prop_assert!(a.labels().iter().all(|&l| l >= 0 && (l as usize) < k));
    }
}
