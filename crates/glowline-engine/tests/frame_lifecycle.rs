use glowline_engine::crt::{apply_bloom_linear, effects};
use glowline_engine::tessellate::stroke_polyline;
use glowline_engine::{
    BackendDesc, BlendMode, Color, Context, CrtProfile, ErrorCode, FillStyle, FrameDesc, LineCap, Rect,
    StencilMode, StencilState, StrokeStyle, Vec2,
};

const W: u32 = 640;
const H: u32 = 480;

fn context() -> Context {
    let mut ctx = Context::new(BackendDesc::Software).expect("software context");
    ctx.set_crt_profile(CrtProfile::clean()).unwrap();
    ctx
}

fn begin(ctx: &mut Context) {
    ctx.begin_frame(FrameDesc::offscreen(W, H, 1.0 / 60.0)).unwrap();
}

fn rasterize(ctx: &Context) -> Vec<u8> {
    let mut pixels = vec![0u8; (W * H * 4) as usize];
    ctx.debug_rasterize_rgba8(&mut pixels, W, H, W as usize * 4).unwrap();
    pixels
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let o = ((y * W + x) * 4) as usize;
    [pixels[o], pixels[o + 1], pixels[o + 2], pixels[o + 3]]
}

// ── end to end ───────────────────────────────────────────────────────────

#[test]
fn single_segment_lights_a_band_at_the_top_edge() {
    let mut ctx = context();
    begin(&mut ctx);

    let color = Color::rgb(0.2, 1.0, 0.4);
    let style = StrokeStyle::new(2.0, color).with_cap(LineCap::Butt);
    ctx.draw_polyline(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)], false, &style)
        .unwrap();

    let stats = ctx.frame_stats();
    assert_eq!(stats.commands, 1);
    assert_eq!(stats.triangles, 2);
    assert_eq!(stats.vertices, 6);

    ctx.end_frame().unwrap();

    let pixels = rasterize(&ctx);
    for x in 0..10 {
        assert_eq!(pixel(&pixels, x, 0), [51, 255, 102, 255], "x = {x}");
        assert_eq!(pixel(&pixels, x, 1), [0, 0, 0, 0], "x = {x}");
    }
    assert_eq!(pixel(&pixels, 10, 0), [0, 0, 0, 0]);
}

#[test]
fn capture_rejects_short_stride() {
    let ctx = context();
    let mut pixels = vec![0u8; 16 * 16 * 4];
    let err = ctx.debug_rasterize_rgba8(&mut pixels, 16, 16, 60).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn strided_capture_matches_packed_capture() {
    let mut ctx = context();
    begin(&mut ctx);
    ctx.draw_polyline(
        &[Vec2::new(2.0, 2.0), Vec2::new(12.0, 9.0)],
        false,
        &StrokeStyle::new(3.0, Color::white()),
    )
    .unwrap();
    ctx.end_frame().unwrap();

    let (w, h) = (16u32, 12u32);
    let mut packed = vec![0u8; (w * h * 4) as usize];
    ctx.debug_rasterize_rgba8(&mut packed, w, h, w as usize * 4).unwrap();

    let stride = w as usize * 4 + 12;
    let mut strided = vec![0u8; stride * h as usize];
    ctx.debug_rasterize_rgba8(&mut strided, w, h, stride).unwrap();

    for y in 0..h as usize {
        let row = w as usize * 4;
        assert_eq!(&packed[y * row..(y + 1) * row], &strided[y * stride..y * stride + row]);
    }
}

// ── tessellation counts ──────────────────────────────────────────────────

#[test]
fn open_butt_polylines_emit_two_triangles_per_segment() {
    let style = StrokeStyle::new(1.5, Color::white());
    for n in 2..12usize {
        let points: Vec<Vec2> = (0..n)
            .map(|i| Vec2::new(i as f32 * 10.0, if i % 2 == 0 { 0.0 } else { 7.0 }))
            .collect();
        let mut out: Vec<Vec2> = Vec::new();
        let tris = stroke_polyline(&points, false, &style, &mut out).unwrap();
        assert_eq!(tris, 2 * (n - 1));
        assert_eq!(out.len(), 6 * (n - 1));
    }
}

#[test]
fn closed_polylines_include_wrap_segment_and_no_caps() {
    let square = [
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 10.0),
        Vec2::new(0.0, 10.0),
    ];
    for cap in [LineCap::Butt, LineCap::Round, LineCap::Square] {
        let style = StrokeStyle::new(2.0, Color::white()).with_cap(cap);
        let mut out: Vec<Vec2> = Vec::new();
        let tris = stroke_polyline(&square, true, &style, &mut out).unwrap();
        assert_eq!(tris, 2 * square.len(), "{cap:?}");
    }
}

#[test]
fn every_cubic_flattens_to_sixteen_segments() {
    let mut ctx = context();
    begin(&mut ctx);

    let mut path = ctx.create_path();
    path.move_to(10.0, 10.0).cubic_to(
        Vec2::new(60.0, 10.0),
        Vec2::new(60.0, 80.0),
        Vec2::new(110.0, 80.0),
    );
    ctx.draw_path_stroke(&path, &StrokeStyle::new(2.0, Color::white()))
        .unwrap();
    assert_eq!(ctx.frame_stats().triangles, 2 * 16);

    // A tiny curve still gets sixteen segments.
    path.clear();
    path.move_to(200.0, 200.0).cubic_to(
        Vec2::new(201.0, 200.0),
        Vec2::new(201.0, 201.0),
        Vec2::new(202.0, 202.0),
    );
    ctx.draw_path_stroke(&path, &StrokeStyle::new(2.0, Color::white()))
        .unwrap();
    assert_eq!(ctx.frame_stats().triangles, 4 * 16);
    ctx.end_frame().unwrap();
}

#[test]
fn malformed_path_is_rejected_without_recording() {
    let mut ctx = context();
    begin(&mut ctx);
    let mut path = ctx.create_path();
    path.line_to(5.0, 5.0);
    let err = ctx.draw_path_stroke(&path, &StrokeStyle::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert_eq!(ctx.frame_stats().vertices, 0);
    ctx.end_frame().unwrap();
}

// ── batching ─────────────────────────────────────────────────────────────

#[test]
fn identical_back_to_back_strokes_merge() {
    let mut ctx = context();
    begin(&mut ctx);
    let pts = [Vec2::new(0.0, 0.0), Vec2::new(50.0, 20.0), Vec2::new(90.0, 5.0)];
    let style = StrokeStyle::new(2.0, Color::white());

    ctx.draw_polyline(&pts, false, &style).unwrap();
    let single = ctx.frame_stats().vertices;
    ctx.draw_polyline(&pts, false, &style).unwrap();

    let stats = ctx.frame_stats();
    assert_eq!(stats.commands, 1);
    assert_eq!(stats.vertices, 2 * single);
    ctx.end_frame().unwrap();
}

#[test]
fn interleaved_style_splits_runs() {
    let mut ctx = context();
    begin(&mut ctx);
    let pts = [Vec2::new(0.0, 0.0), Vec2::new(50.0, 20.0)];
    let a = StrokeStyle::new(2.0, Color::white());
    let b = a.with_blend(BlendMode::Additive);

    ctx.draw_polyline(&pts, false, &a).unwrap();
    ctx.draw_polyline(&pts, false, &b).unwrap();
    ctx.draw_polyline(&pts, false, &a).unwrap();
    assert_eq!(ctx.frame_stats().commands, 3);
    ctx.end_frame().unwrap();
}

#[test]
fn clip_change_splits_runs() {
    let mut ctx = context();
    begin(&mut ctx);
    let pts = [Vec2::new(0.0, 0.0), Vec2::new(50.0, 20.0)];
    let style = StrokeStyle::new(2.0, Color::white());

    ctx.draw_polyline(&pts, false, &style).unwrap();
    ctx.push_clip(Rect::new(0.0, 0.0, 20.0, 20.0)).unwrap();
    ctx.draw_polyline(&pts, false, &style).unwrap();
    ctx.pop_clip().unwrap();
    assert_eq!(ctx.frame_stats().commands, 2);
    ctx.end_frame().unwrap();
}

#[test]
fn begin_frame_discards_previous_commands() {
    let mut ctx = context();
    begin(&mut ctx);
    ctx.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), &FillStyle::new(Color::white()))
        .unwrap();
    ctx.end_frame().unwrap();
    assert_eq!(ctx.frame_stats().commands, 1);

    begin(&mut ctx);
    assert_eq!(ctx.frame_stats().commands, 0);
    ctx.end_frame().unwrap();
}

// ── transform and clip ───────────────────────────────────────────────────

#[test]
fn transform_round_trip_is_bit_identical() {
    let mut ctx = context();
    begin(&mut ctx);
    ctx.translate(3.0, 4.0).unwrap();
    ctx.rotate(0.7).unwrap();
    let before = ctx.transform();

    ctx.push_transform().unwrap();
    ctx.translate(0.1, 123.456).unwrap();
    ctx.draw_polyline(
        &[Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0)],
        false,
        &StrokeStyle::default(),
    )
    .unwrap();
    ctx.pop_transform().unwrap();

    let after = ctx.transform();
    assert_eq!(after, before);
    assert_eq!(after.tx.to_bits(), before.tx.to_bits());
    ctx.end_frame().unwrap();
}

#[test]
fn nested_clips_intersect() {
    let mut ctx = context();
    begin(&mut ctx);
    ctx.push_clip(Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
    ctx.push_clip(Rect::new(50.0, 50.0, 100.0, 100.0)).unwrap();
    assert_eq!(ctx.clip(), Some(Rect::new(50.0, 50.0, 50.0, 50.0)));
    ctx.end_frame().unwrap();
}

#[test]
fn clipped_fill_stays_inside_clip() {
    let mut ctx = context();
    begin(&mut ctx);
    ctx.push_clip(Rect::new(10.0, 10.0, 5.0, 5.0)).unwrap();
    ctx.fill_rect(Rect::new(0.0, 0.0, 40.0, 40.0), &FillStyle::new(Color::white()))
        .unwrap();
    ctx.end_frame().unwrap();

    let pixels = rasterize(&ctx);
    assert_eq!(pixel(&pixels, 12, 12), [255; 4]);
    assert_eq!(pixel(&pixels, 9, 12), [0; 4]);
    assert_eq!(pixel(&pixels, 15, 12), [0; 4]);
}

// ── ownership and state errors ───────────────────────────────────────────

#[test]
fn foreign_path_is_rejected() {
    let mut a = context();
    let b = context();
    let mut path = b.create_path();
    path.move_to(0.0, 0.0).line_to(10.0, 10.0);

    begin(&mut a);
    let err = a.draw_path_stroke(&path, &StrokeStyle::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    a.end_frame().unwrap();
}

#[test]
fn invalid_style_is_rejected() {
    let mut ctx = context();
    begin(&mut ctx);
    let pts = [Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0)];
    for style in [
        StrokeStyle::new(0.0, Color::white()),
        StrokeStyle::new(f32::NAN, Color::white()),
        StrokeStyle::new(1.0, Color::white()).with_intensity(1.5),
    ] {
        let err = ctx.draw_polyline(&pts, false, &style).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }
    assert_eq!(ctx.frame_stats().commands, 0);
    ctx.end_frame().unwrap();
}

#[test]
fn software_backend_records_stencil_but_cannot_clear_it() {
    let mut ctx = context();
    begin(&mut ctx);
    let style = StrokeStyle::new(2.0, Color::white())
        .with_stencil(StencilState { mode: StencilMode::Write, reference: 1 });
    ctx.draw_polyline(&[Vec2::new(0.0, 0.0), Vec2::new(5.0, 0.0)], false, &style)
        .unwrap();
    assert_eq!(ctx.clear_stencil().unwrap_err().code(), ErrorCode::Unsupported);
    ctx.end_frame().unwrap();
}

// ── CRT model ────────────────────────────────────────────────────────────

#[test]
fn persistence_is_frame_rate_independent() {
    let f = effects::persistence_factor(0.9, 1.0 / 30.0);
    assert!((f - 0.81).abs() < 1e-5, "{f}");
    let two_ticks = effects::persistence_factor(0.9, 1.0 / 60.0).powi(2);
    assert!((f - two_ticks).abs() < 1e-5);
}

#[test]
fn bloom_never_exceeds_one() {
    let (w, h) = (32usize, 32usize);
    let mut px = vec![0.0f32; w * h * 4];
    for (i, v) in px.iter_mut().enumerate() {
        *v = if (i / 4) % 3 == 0 { 1.0 } else { 0.9 };
    }
    apply_bloom_linear(&mut px, w, h, 1.0, 6.0);
    assert!(px.iter().all(|&v| v <= 1.0));
}

#[test]
fn jittered_capture_is_reproducible() {
    let mut ctx = context();
    ctx.set_crt_profile(CrtProfile::vector_monitor()).unwrap();
    begin(&mut ctx);
    ctx.draw_text("GLOW 42", Vec2::new(20.0, 20.0), 24.0, &StrokeStyle::new(2.0, Color::white()))
        .unwrap();
    ctx.end_frame().unwrap();

    assert_eq!(rasterize(&ctx), rasterize(&ctx));
}
