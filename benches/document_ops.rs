//! Benchmarks for the editor reducer and the streaming merge path

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridboard_rs::api::TsPoint;
use gridboard_rs::data::FeedSnapshot;
use gridboard_rs::editor::{reduce, EditorAction, EditorSession, GeometryChange};
use gridboard_rs::model::{Widget, WidgetCategory, WidgetGeometry, WidgetId};
use gridboard_rs::Dashboard;

fn session_with_widgets(count: usize) -> EditorSession {
    let mut session = EditorSession::with_document(Dashboard::new_empty("Bench"));
    for i in 0..count {
        let mut widget = Widget::new(
            WidgetCategory::Latest,
            format!("Widget {}", i),
            WidgetGeometry::new((i as i32 % 6) * 4, (i as i32 / 6) * 3, 4, 3),
        );
        widget.id = WidgetId::from(format!("w{}", i).as_str());
        session = reduce(session, EditorAction::AddWidget(widget));
    }
    session
}

fn bench_reducer(c: &mut Criterion) {
    c.bench_function("reduce_update_geometry_50_widgets", |b| {
        let session = session_with_widgets(50);
        let changes: Vec<GeometryChange> = (0..50)
            .map(|i| GeometryChange {
                id: WidgetId::from(format!("w{}", i).as_str()),
                col: i % 20,
                row: i / 20,
                size_x: 4,
                size_y: 3,
            })
            .collect();
        b.iter(|| {
            let next = reduce(
                session.clone(),
                EditorAction::UpdateGeometry(black_box(changes.clone())),
            );
            black_box(next)
        });
    });

    c.bench_function("reduce_add_remove_widget", |b| {
        let session = session_with_widgets(20);
        b.iter(|| {
            let mut widget = Widget::new(
                WidgetCategory::Latest,
                "Extra",
                WidgetGeometry::new(0, 100, 4, 3),
            );
            widget.id = WidgetId::from("extra");
            let next = reduce(session.clone(), EditorAction::AddWidget(widget));
            let next = reduce(next, EditorAction::RemoveWidget(WidgetId::from("extra")));
            black_box(next)
        });
    });
}

fn bench_stream_merge(c: &mut Criterion) {
    c.bench_function("merge_stream_batch_100_into_500", |b| {
        let mut base = FeedSnapshot::default();
        let seed: Vec<TsPoint> = (0..500).map(|t| TsPoint::new(t, "v")).collect();
        base.merge_stream_points("temp", "Temperature", seed);

        let batch: Vec<TsPoint> = (450..550).map(|t| TsPoint::new(t, "w")).collect();
        b.iter(|| {
            let mut snapshot = base.clone();
            snapshot.merge_stream_points("temp", "Temperature", black_box(batch.clone()));
            black_box(snapshot)
        });
    });
}

criterion_group!(benches, bench_reducer, bench_stream_merge);
criterion_main!(benches);
