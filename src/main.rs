//! Lightdesk entry point
//!
//! Runs a scripted planning session that exercises the full safety
//! envelope: bootstrap, equipment placement, environment switching,
//! checkpoints, an injected renderer failure, and a rollback.

use glam::Vec3;

use lightdesk::PlannerApp;
use lightdesk::environment::RoomPreset;

fn main() {
    env_logger::init();
    log::info!("Lightdesk starting...");

    let mut app = PlannerApp::new();
    app.flags_mut().set_flag("experimental_gels", false);
    if let Err(err) = app.bootstrap() {
        log::error!("Bootstrap failed: {err}");
        return;
    }
    if app.flags().flag("experimental_gels") {
        log::info!("Experimental gel rendering enabled");
    }

    // Rough three-point setup on the default sound stage
    if let Ok(id) = app.place_equipment("skypanel-s60", Vec3::new(2.0, 0.0, 2.0)) {
        log::info!("Key light placed as item {id}");
    }
    let _ = app.place_equipment("astera-tube", Vec3::new(-2.0, 0.0, 1.0));
    let _ = app.place_equipment("flag-4x4", Vec3::new(1.5, 0.0, 1.2));

    app.checkpoint("THREE_POINT");

    // Try the same look in a tighter room
    let _ = app.switch_environment(RoomPreset::LocationHouse);
    let _ = app.place_equipment("arri-650", Vec3::new(1.0, 0.0, -1.0));
    let _ = app.resize(1920, 1080);
    for _ in 0..120 {
        let _ = app.animate(1.0 / 60.0);
    }

    // Unknown equipment is refused and the state rolled back, not a crash
    if app.place_equipment("fog-machine", Vec3::ZERO).is_err() {
        log::info!("Unknown equipment refused; state rolled back");
    }

    // Renderer loss degrades quality instead of killing the session
    app.report_renderer_failure("WebGPU device lost");

    // Back to the saved look
    if app.rollback("THREE_POINT").is_ok() {
        log::info!("Rolled back to THREE_POINT");
    }

    let room = app.environment().room;
    println!(
        "phase: {} | {} items in a {}x{}m {} | {} quality | {} snapshots | {} checkpoints",
        app.phase(),
        app.equipment().items.len(),
        room.width,
        room.length,
        app.environment().preset.as_str(),
        app.render_settings().quality.as_str(),
        app.recovery().snapshot_count(),
        app.protection().list_checkpoints().len(),
    );
}
