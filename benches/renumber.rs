//! This bench builds a large synthetic outline from rows with gappy
//! numbering, then renumbers it sequentially and per top-level section.

#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use outline::{domain::build_tree, ArtifactKind, OutlineItem, Renumberer};

/// 50 chapters, each with 20 sections of 10 requirements, numbered with gaps
fn items() -> Vec<OutlineItem> {
    let mut items = Vec::new();
    for chapter in 1..=50 {
        items.push(OutlineItem::new(
            ArtifactKind::Heading,
            (chapter * 2).to_string(),
            "Chapter",
        ));
        for section in 1..=20 {
            let section = format!("{}.{}", chapter * 2, section * 3);
            items.push(OutlineItem::new(ArtifactKind::Heading, &section, "Section"));
            for requirement in 1..=10 {
                items.push(OutlineItem::new(
                    ArtifactKind::Requirement,
                    format!("{section}-{}", requirement + 1),
                    "The system shall do something measurable.",
                ));
            }
        }
    }
    items
}

fn build(c: &mut Criterion) {
    c.bench_function("build tree", |b| {
        b.iter_batched(items, |items| build_tree(items), BatchSize::SmallInput);
    });
}

fn renumber(c: &mut Criterion) {
    let tree = build_tree(items()).tree;
    c.bench_function("renumber", |b| b.iter(|| Renumberer::renumber(&tree)));
    c.bench_function("renumber parallel", |b| {
        b.iter(|| Renumberer::renumber_parallel(&tree));
    });
}

criterion_group!(benches, build, renumber);
criterion_main!(benches);
