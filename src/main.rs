//! Tooltip Inventory
//!
//! Reads item tooltips off the screen: finds the tooltip next to the pointer,
//! extracts the item name and trait with OCR and appends them to an inventory
//! CSV. On Windows, F12 runs one capture and Ctrl+F12 exits. On every platform
//! an image file can be processed directly:
//!
//! ```text
//! tooltip-inventory <image> [pointer_x pointer_y]
//! ```

mod capture;
mod diagnostics;
mod inventory;
mod ocr;
mod paths;
mod pipeline;
mod tooltip;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use diagnostics::Diagnostics;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("tooltip_inventory.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

/// Command line: an optional image file and an optional pointer position.
#[derive(Debug, PartialEq)]
struct FileArgs {
    image: PathBuf,
    reference: Option<(i32, i32)>,
}

fn parse_args(args: &[String]) -> Result<Option<FileArgs>> {
    match args {
        [] => Ok(None),
        [image] => Ok(Some(FileArgs {
            image: PathBuf::from(image),
            reference: None,
        })),
        [image, x, y] => {
            let x = x.parse().with_context(|| format!("Invalid pointer x: {}", x))?;
            let y = y.parse().with_context(|| format!("Invalid pointer y: {}", y))?;
            Ok(Some(FileArgs {
                image: PathBuf::from(image),
                reference: Some((x, y)),
            }))
        }
        _ => Err(anyhow!("Usage: tooltip-inventory [<image> [pointer_x pointer_y]]")),
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("tooltip_inventory.log");
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));
}

fn main() -> Result<()> {
    install_panic_hook();

    paths::ensure_directories()?;
    inventory::init_config();
    let config = inventory::get_config();

    if let Err(e) = ocr::ensure_tesseract(&config.language) {
        log(&format!("Warning: Failed to setup Tesseract: {}", e));
        log("OCR features may not work correctly.");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        Some(file) => run_file(&file),
        None => run_hotkeys(),
    }
}

fn run_file(file: &FileArgs) -> Result<()> {
    let config = inventory::get_config();
    let engine = inventory::engine_from_config(config);
    let diagnostics = if config.save_diagnostics {
        Diagnostics::in_dir(paths::get_cache_dir())
    } else {
        Diagnostics::disabled()
    };

    let output = inventory::process_image_file(&file.image, file.reference, config, &engine, diagnostics)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(windows)]
fn run_hotkeys() -> Result<()> {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        RegisterHotKey, UnregisterHotKey, MOD_CONTROL, MOD_NOREPEAT, VK_F12,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetMessageW, MSG, WM_HOTKEY};

    const HOTKEY_CAPTURE: i32 = 1;
    const HOTKEY_EXIT: i32 = 2;

    let config = inventory::get_config();
    let engine = inventory::engine_from_config(config);
    let out = inventory::OutputPaths::standard(config);
    let screen = capture::GdiScreen;

    // Hotkeys without a window are posted to this thread's queue
    unsafe {
        RegisterHotKey(HWND::default(), HOTKEY_CAPTURE, MOD_NOREPEAT, VK_F12.0 as u32)?;
        RegisterHotKey(HWND::default(), HOTKEY_EXIT, MOD_CONTROL | MOD_NOREPEAT, VK_F12.0 as u32)?;
    }

    log("Tooltip Inventory started");
    log("Hotkey: F12 (capture tooltip and add to inventory)");
    log("Hotkey: Ctrl+F12 (exit)");

    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {
            if msg.message != WM_HOTKEY {
                continue;
            }
            match msg.wParam.0 as i32 {
                HOTKEY_CAPTURE => {
                    log("Hotkey pressed! Capturing...");
                    match inventory::run_once(&screen, &screen, config, &engine, &out) {
                        Ok(output) => log(&format!(
                            "Item: {} | Trait: {}",
                            output.fields.name_text.as_deref().unwrap_or("-"),
                            output.fields.trait_text.as_deref().unwrap_or("-")
                        )),
                        Err(e) => log(&format!("Capture failed: {:#}", e)),
                    }
                }
                HOTKEY_EXIT => {
                    log("Exit requested");
                    break;
                }
                _ => {}
            }
        }

        let _ = UnregisterHotKey(HWND::default(), HOTKEY_CAPTURE);
        let _ = UnregisterHotKey(HWND::default(), HOTKEY_EXIT);
    }

    Ok(())
}

#[cfg(not(windows))]
fn run_hotkeys() -> Result<()> {
    Err(anyhow!(
        "Live capture needs Windows. Usage: tooltip-inventory <image> [pointer_x pointer_y]"
    ))
}
