//! Integration tests for the download buttons.
//!
//! The app is configured with a download directory, so exports never open a
//! save dialog.

mod common;

use crate::common::TestCtx;
use kittest::Queryable;

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .expect("utf-8 file name")
        .to_owned()
}

fn is_export_name(name: &str, extension: &str) -> bool {
    name.strip_prefix("qrcode-")
        .and_then(|rest| rest.strip_suffix(extension))
        .and_then(|rest| rest.strip_suffix('.'))
        .is_some_and(|millis| !millis.is_empty() && millis.bytes().all(|b| b.is_ascii_digit()))
}

#[tokio::test(start_paused = true)]
async fn test_download_does_nothing_before_success() {
    let mut ctx = TestCtx::new_app();
    ctx.harness_mut().step();

    ctx.harness_mut().get_by_label("Download PNG").click();
    ctx.harness_mut().step();
    ctx.harness_mut().step();

    assert!(ctx.downloads().is_empty());
    assert!(ctx.harness().state().state.notice.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_download_png_writes_timestamped_file() {
    let mut ctx = TestCtx::new_app();
    ctx.set_text("https://example.com");
    ctx.settle().await;

    ctx.harness_mut().get_by_label("Download PNG").click();
    ctx.harness_mut().step();
    ctx.harness_mut().step();

    let downloads = ctx.downloads();
    assert_eq!(downloads.len(), 1, "exactly one file: {downloads:?}");
    assert!(is_export_name(&file_name(&downloads[0]), "png"));

    let bytes = std::fs::read(&downloads[0]).expect("readable");
    assert!(bytes.starts_with(b"\x89PNG"));

    assert!(
        ctx.harness_mut().query_by_label_contains("Saved").is_some(),
        "Saved notice should be shown"
    );
}

#[tokio::test(start_paused = true)]
async fn test_download_svg_writes_cached_markup() {
    let mut ctx = TestCtx::new_app();
    ctx.set_text("https://example.com");
    ctx.settle().await;

    ctx.harness_mut().get_by_label("Download SVG").click();
    ctx.harness_mut().step();
    ctx.harness_mut().step();

    let downloads = ctx.downloads();
    assert_eq!(downloads.len(), 1, "exactly one file: {downloads:?}");
    assert!(is_export_name(&file_name(&downloads[0]), "svg"));

    let svg = std::fs::read_to_string(&downloads[0]).expect("readable");
    let expected = &ctx.generation().result().expect("succeeded").svg;
    assert_eq!(&svg, expected);
}

#[tokio::test(start_paused = true)]
async fn test_download_disabled_after_failure() {
    let mut ctx = TestCtx::new_app();
    ctx.set_text(&"A".repeat(4000));
    ctx.settle().await;
    assert!(ctx.generation().error().is_some());

    ctx.harness_mut().get_by_label("Download SVG").click();
    ctx.harness_mut().step();
    ctx.harness_mut().step();

    assert!(ctx.downloads().is_empty());
}
