use tabmimic_core::{
    ColumnSpec, DeclaredType, GenerateOptions, Lookup, MemorySink, Profile, Sink, Strategy, Value,
};
use tabmimic_generate::{
    BatchOrchestrator, FragmentGenerator, GenerationError, build_generators, generate_into,
};

fn clients_profile() -> Profile {
    [
        ColumnSpec::new("id", DeclaredType::Int, Strategy::IncrementalId),
        ColumnSpec::new(
            "city",
            DeclaredType::String,
            Strategy::Categorical {
                values: vec![Value::from("Kazan"), Value::from("Omsk")],
                probabilities: vec![0.5, 0.5],
            },
        ),
        ColumnSpec::new("note", DeclaredType::String, Strategy::ExplicitNull),
    ]
    .into_iter()
    .collect()
}

/// Emits a fixed pair of columns, optionally one row short from the given
/// call on (1-based).
struct PairGenerator {
    columns: Vec<String>,
    active: bool,
    calls: usize,
    short_from: Option<usize>,
}

impl PairGenerator {
    fn new() -> Self {
        Self {
            columns: vec!["first".to_string(), "last".to_string()],
            active: false,
            calls: 0,
            short_from: None,
        }
    }

    fn short_from(call: usize) -> Self {
        Self {
            short_from: Some(call),
            ..Self::new()
        }
    }
}

impl FragmentGenerator for PairGenerator {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn activate(&mut self, _lookup: &dyn Lookup) -> Result<(), GenerationError> {
        self.active = true;
        Ok(())
    }

    fn next_fragment(
        &mut self,
        n: usize,
        _lookup: &dyn Lookup,
    ) -> Result<Vec<Vec<Value>>, GenerationError> {
        self.calls += 1;
        let short = self.short_from.is_some_and(|call| self.calls >= call);
        let last_len = if short { n.saturating_sub(1) } else { n };
        Ok(vec![
            vec![Value::from("Ivan"); n],
            vec![Value::from("Petrov"); last_len],
        ])
    }
}

#[test]
fn flushes_full_batches_then_the_remainder() {
    let mut sink = MemorySink::new("clients");
    let options = GenerateOptions {
        batch_size: 100,
        seed: Some(9),
    };
    let report = generate_into(&clients_profile(), &options, &mut sink, 250).expect("generate");

    assert_eq!(report.flushes, vec![100, 100, 50]);
    assert_eq!(report.rows_written, 250);
    assert_eq!(sink.flushes(), &[100, 100, 50]);
    assert_eq!(sink.columns(), &["id", "city", "note"]);
    assert_eq!(sink.rows().len(), 250);

    let ids: Vec<i64> = sink.column("id").iter().filter_map(Value::as_i64).collect();
    assert_eq!(ids, (1..=250).collect::<Vec<_>>());
    assert!(sink.column("note").iter().all(Value::is_null));
}

#[test]
fn zero_rows_creates_the_table_and_flushes_nothing() {
    let mut sink = MemorySink::new("clients");
    let report = generate_into(&clients_profile(), &GenerateOptions::default(), &mut sink, 0)
        .expect("generate");
    assert!(report.flushes.is_empty());
    assert!(sink.flushes().is_empty());
    assert_eq!(sink.columns(), &["id", "city", "note"]);
}

#[test]
fn schema_only_profile_creates_the_table() {
    let profile: Profile = [ColumnSpec::schema_only("a", DeclaredType::Int)]
        .into_iter()
        .collect();
    let mut sink = MemorySink::new("t");
    generate_into(&profile, &GenerateOptions::default(), &mut sink, 0).expect("create only");
    assert_eq!(sink.columns(), &["a"]);

    let err = generate_into(&profile, &GenerateOptions::default(), &mut sink, 5)
        .expect_err("no strategy");
    assert!(matches!(err, GenerationError::MissingStrategy { .. }));
}

#[test]
fn second_run_continues_identifiers() {
    let mut sink = MemorySink::new("clients");
    let options = GenerateOptions {
        batch_size: 10,
        seed: Some(1),
    };
    generate_into(&clients_profile(), &options, &mut sink, 5).expect("first run");
    generate_into(&clients_profile(), &options, &mut sink, 5).expect("second run");
    let ids: Vec<i64> = sink.column("id").iter().filter_map(Value::as_i64).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[test]
fn same_seed_reproduces_rows() {
    let options = GenerateOptions {
        batch_size: 7,
        seed: Some(2024),
    };
    let mut first = MemorySink::new("clients");
    let mut second = MemorySink::new("clients");
    generate_into(&clients_profile(), &options, &mut first, 30).expect("first");
    generate_into(&clients_profile(), &options, &mut second, 30).expect("second");
    assert_eq!(first.rows(), second.rows());
}

#[test]
fn composite_generators_fill_several_columns() {
    let mut generators = build_generators(&clients_profile(), 3).expect("generators");
    generators.push(Box::new(PairGenerator::new()));
    let mut sink = MemorySink::new("clients");
    let orchestrator = BatchOrchestrator::new(4).expect("orchestrator");
    let report = orchestrator
        .run(&mut generators, 6, &mut sink)
        .expect("run");
    assert_eq!(report.flushes, vec![4, 2]);
    assert_eq!(sink.columns(), &["id", "city", "note", "first", "last"]);
    assert_eq!(sink.rows()[5][4], Value::from("Petrov"));
}

#[test]
fn short_fragment_aborts_before_flushing() {
    let mut generators: Vec<Box<dyn FragmentGenerator>> = vec![Box::new(PairGenerator::short_from(1))];
    let mut sink = MemorySink::new("people");
    let orchestrator = BatchOrchestrator::new(10).expect("orchestrator");
    let err = orchestrator
        .run(&mut generators, 25, &mut sink)
        .expect_err("mismatch");
    assert!(matches!(
        err,
        GenerationError::BatchMismatch { ref column, expected: 10, actual: 9 } if column == "last"
    ));
    assert!(sink.flushes().is_empty());
}

#[test]
fn batches_flushed_before_a_mismatch_stay_flushed() {
    let mut generators: Vec<Box<dyn FragmentGenerator>> =
        vec![Box::new(PairGenerator::short_from(2))];
    let mut sink = MemorySink::new("people");
    let orchestrator = BatchOrchestrator::new(10).expect("orchestrator");
    let err = orchestrator
        .run(&mut generators, 25, &mut sink)
        .expect_err("mismatch");
    assert!(matches!(
        err,
        GenerationError::BatchMismatch { ref column, expected: 10, actual: 9 } if column == "last"
    ));
    assert_eq!(sink.flushes(), &[10]);
    assert_eq!(sink.rows().len(), 10);
}

#[test]
fn duplicate_output_columns_are_rejected() {
    let mut generators: Vec<Box<dyn FragmentGenerator>> = vec![
        Box::new(PairGenerator::new()),
        Box::new(PairGenerator::new()),
    ];
    let mut sink = MemorySink::new("people");
    sink.create_if_absent(&[]).expect("create");
    let err = BatchOrchestrator::new(5)
        .expect("orchestrator")
        .run(&mut generators, 5, &mut sink)
        .expect_err("duplicate");
    assert!(matches!(err, GenerationError::DuplicateColumn(ref name) if name == "first"));
}
