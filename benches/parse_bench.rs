use criterion::{criterion_group, criterion_main, Criterion};
use gledger::{parse::parse, Ledger};

fn generated_ledger(days: usize) -> String {
    let mut src = String::new();
    for day in 0..days {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            + chrono::Duration::days(day as i64);
        src.push_str(&format!(
            "{} Groceries run {}\n  expenses:groceries  ${}.{:02}\n  assets:checking  -${}.{:02}\n\n",
            date,
            day,
            day % 97,
            day % 100,
            day % 97,
            day % 100
        ));
    }
    src
}

fn criterion_benchmark(c: &mut Criterion) {
    let src = match std::env::var("GLEDGER_BENCH_INPUT") {
        Ok(path) => std::fs::read_to_string(path).unwrap(),
        Err(_) => generated_ledger(5000),
    };
    c.bench_function("Parse text", |b| b.iter(|| parse(&src).unwrap()));
    c.bench_function("Load and report", |b| {
        b.iter(|| {
            let mut ledger = Ledger::new();
            ledger.load(&src).unwrap();
            ledger.generate_balance_report().unwrap()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
