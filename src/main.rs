// GUI-subsystem binary: no console window is ever allocated by Windows.
// In CLI mode (--input/-i flag present) we attach to the launching terminal
// so println!/eprintln! reach it despite SUBSYSTEM:WINDOWS.
#![windows_subsystem = "windows"]

#[macro_use]
pub mod logger;
mod api;
mod app;
mod canvas;
mod cli;
mod components;
mod io;
mod project;
mod settings;

use app::PixelPostApp;
use eframe::egui;
use std::process::ExitCode;

fn main() -> ExitCode {
    // -- Windows console management ------------------------------------
    // The binary never gets a console from Windows; in CLI mode, attach to
    // the parent terminal so batch output lands where the user typed.
    #[cfg(target_os = "windows")]
    if cli::CliArgs::is_cli_mode() {
        unsafe extern "system" {
            fn AttachConsole(dwProcessId: u32) -> i32;
        }
        const ATTACH_PARENT_PROCESS: u32 = 0xFFFF_FFFF;
        unsafe {
            AttachConsole(ATTACH_PARENT_PROCESS);
        }
    }

    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        return cli::run(args);
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1180.0, 760.0])
            .with_title("PixelPost"),
        ..Default::default()
    };

    match eframe::run_native(
        "PixelPost",
        options,
        Box::new(|cc| Box::new(PixelPostApp::new(cc))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("window creation failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
