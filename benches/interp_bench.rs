use criterion::{Criterion, criterion_group, criterion_main};
use es5_interp::{Interpreter, evaluate_script, parse_program};
use std::hint::black_box;

// Initialize logger for benchmark so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_bench_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).try_init();
}

const FIB: &str = r#"
    function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }
    fib(18);
"#;

const OBJECTS: &str = r#"
    var list = [];
    for (var i = 0; i < 2000; i++) {
        list.push({ id: i, name: 'item' + i, tags: ['a', 'b'] });
    }
    var text = JSON.stringify(list);
    JSON.parse(text).filter(function (o) { return o.id % 3 === 0; }).length;
"#;

const STRINGS: &str = r#"
    var s = '';
    for (var i = 0; i < 500; i++) { s += 'word' + i + ' '; }
    s.replace(/word(\d+)/g, '$1').split(' ').sort().join(',').length;
"#;

fn bench_parse(c: &mut Criterion) {
    let source = [FIB, OBJECTS, STRINGS].concat();
    c.bench_function("parse_program", |b| {
        b.iter(|| black_box(parse_program(black_box(&source), None, false).map(|p| p.body.len()).unwrap_or(0)))
    });
}

fn bench_fib(c: &mut Criterion) {
    c.bench_function("fib_18", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new().unwrap();
            black_box(interp.execute_string(FIB, None).unwrap())
        })
    });
}

fn bench_objects_and_json(c: &mut Criterion) {
    c.bench_function("objects_json_roundtrip", |b| {
        b.iter(|| {
            let mut interp = Interpreter::new().unwrap();
            black_box(interp.execute_string(OBJECTS, None).unwrap())
        })
    });
}

fn bench_strings(c: &mut Criterion) {
    c.bench_function("string_regexp", |b| b.iter(|| black_box(evaluate_script(STRINGS, None::<&std::path::Path>).unwrap())));
}

criterion_group!(benches, bench_parse, bench_fib, bench_objects_and_json, bench_strings);
criterion_main!(benches);
