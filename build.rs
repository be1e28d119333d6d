//! Surfaces FFmpeg discovery hints on Windows, where `ffmpeg-sys-next`
//! cannot rely on pkg-config.

use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];
const DEFAULT_TRIPLET: &str = "x64-windows";

fn warn(message: &str) {
    println!("cargo:warning={message}");
}

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let targets_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !targets_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        warn("FFMPEG_DIR is not set; point it at an FFmpeg install (e.g. from vcpkg) to build sharecrop on Windows.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| DEFAULT_TRIPLET.to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(&triplet);

    if !candidate.exists() {
        warn(&format!("No vcpkg FFmpeg found for triplet {triplet} at {}.", candidate.display()));
        return;
    }

    warn(&format!("Found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it explicitly.", candidate.display()));
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        warn("Set VCPKGRS_DYNAMIC=1 if that FFmpeg was built as shared libraries.");
    }
}
