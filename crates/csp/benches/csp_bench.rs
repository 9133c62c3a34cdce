use core_types::RequestContext;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use csp::{CspConfig, CspPartialResponseWriter, CspStateHandle, escape_for_script};
use markup::{MarkupWriter, PartialResponseWriter, XmlPartialResponseWriter};

const SMALL_ROWS: usize = 64;
const LARGE_ROWS: usize = 5_000;

fn make_script_text(bytes: usize) -> String {
    let mut text = String::with_capacity(bytes + 32);
    while text.len() < bytes {
        text.push_str("show('it\\'s').then(\"x\");</script>\n\u{2028}");
    }
    text
}

fn render_rows(rows: usize) -> usize {
    let request = RequestContext::new();
    let mut w = CspPartialResponseWriter::new(
        XmlPartialResponseWriter::new(String::with_capacity(rows * 96)),
        &request,
        CspStateHandle::new(),
        CspConfig::default(),
    )
    .expect("valid config");
    w.start_document().expect("start");
    w.start_update("form:table").expect("update");
    for row in 0..rows {
        let id = format!("form:table:{row}:edit");
        w.start_element("tr", None).expect("tr");
        w.start_element("td", None).expect("td");
        w.start_element("button", None).expect("button");
        w.write_attribute("id", &id, None).expect("id");
        w.write_attribute("class", "ui-button", None).expect("class");
        w.write_attribute("onclick", "edit(this)", None).expect("onclick");
        w.write_text("Edit", None).expect("text");
        w.end_element("button").expect("end button");
        w.end_element("td").expect("end td");
        w.end_element("tr").expect("end tr");
    }
    w.end_update().expect("end update");
    w.end_document().expect("end document");
    w.into_inner().into_inner().len()
}

fn bench_escape_clean(c: &mut Criterion) {
    let input = "form:table:0:edit".repeat(64);
    c.bench_function("bench_escape_clean", |b| {
        b.iter(|| black_box(escape_for_script(black_box(&input)).len()));
    });
}

fn bench_escape_dirty(c: &mut Criterion) {
    let input = make_script_text(16 * 1024);
    c.bench_function("bench_escape_dirty", |b| {
        b.iter(|| black_box(escape_for_script(black_box(&input)).len()));
    });
}

fn bench_update_small(c: &mut Criterion) {
    c.bench_function("bench_update_small", |b| {
        b.iter(|| black_box(render_rows(black_box(SMALL_ROWS))));
    });
}

fn bench_update_large(c: &mut Criterion) {
    c.bench_function("bench_update_large", |b| {
        b.iter_batched(
            || LARGE_ROWS,
            |rows| black_box(render_rows(rows)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_escape_clean,
    bench_escape_dirty,
    bench_update_small,
    bench_update_large
);
criterion_main!(benches);
