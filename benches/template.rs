use std::hint::black_box;
use std::path::Path;

use criterion::{Criterion, criterion_group, criterion_main};

use extra_files::additional_files::{
    AlbumMetadata, DestinationResolver, Fields, MediaItem, PathFormatRules, Sanitizer, StandardFunctions, Template,
    TemplateEngine,
};

fn fields() -> Fields {
    Fields::from([
        ("artist".to_string(), "John Coltrane".to_string()),
        ("albumartist".to_string(), "John Coltrane".to_string()),
        ("album".to_string(), "Blue Train".to_string()),
        ("albumpath".to_string(), "/music/John Coltrane/Blue Train".to_string()),
        ("basename".to_string(), "rip".to_string()),
        ("filename".to_string(), "CD1_rip".to_string()),
    ])
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_template", |b| {
        b.iter(|| Template::parse(black_box("$albumpath/%lower{%left{$albumartist,8}} - ${album}s/$filename")));
    });
}

fn bench_render(c: &mut Criterion) {
    let template = Template::parse("$albumpath/%if{$albumartist,%upper{$albumartist},$artist} - $filename")
        .expect("Invalid benchmark template");
    let fields = fields();

    c.bench_function("render_template", |b| {
        b.iter(|| StandardFunctions.render(black_box(&template), black_box(&fields)));
    });
}

fn bench_resolve(c: &mut Criterion) {
    let paths = vec![
        ("artwork".to_string(), "$albumpath/artwork".to_string()),
        ("log".to_string(), "$albumpath/%asciify{$album} audio".to_string()),
    ];
    let rules = PathFormatRules::new(&paths).expect("Invalid benchmark path rules");
    let sanitizer = Sanitizer::default();
    let resolver = DestinationResolver::new(&rules, &StandardFunctions, &sanitizer, "_");
    let metadata = AlbumMetadata::new(
        &MediaItem::new(Some("Sigur Rós"), None, Some("Ágætis byrjun")),
        Path::new("/music/Sigur Rós/Ágætis byrjun"),
    );

    c.bench_function("resolve_destination", |b| {
        b.iter(|| resolver.resolve(black_box(Path::new("CD1/rip.log")), "log", &metadata));
    });
}

criterion_group!(benches, bench_parse, bench_render, bench_resolve);
criterion_main!(benches);
