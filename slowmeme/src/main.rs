mod app;
mod browser;
mod repaint;
mod textures;
mod theme;
mod widgets;

use app::SlowMemeApp;
use eframe::NativeOptions;
use memecore::MemeConfig;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = MemeConfig::load().unwrap_or_else(|e| {
        log::error!("bad config, using defaults: {}", e);
        let mut config = MemeConfig::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    });
    log::info!(
        "starting slowMeme (backend: {}, exports to {})",
        config.backend_url.as_deref().unwrap_or("offline"),
        config.resolved_export_dir().display()
    );

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([760.0, 760.0])
        .with_min_inner_size([560.0, 640.0])
        .with_title("slowMeme");

    let options = NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native("slowMeme", options, Box::new(move |cc| {
        theme::SlowTheme::default().apply(&cc.egui_ctx);
        Box::new(SlowMemeApp::new(cc, config))
    }))
}
