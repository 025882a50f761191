use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Put the linker script somewhere the linker can find it
    let out = match env::var_os("OUT_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => panic!("OUT_DIR not set"),
    };
    if let Err(e) = fs::copy("memory.x", out.join("memory.x")) {
        panic!("cannot copy memory.x: {e}");
    }
    println!("cargo:rustc-link-search={}", out.display());

    // Only re-run when the memory layout changes
    println!("cargo:rerun-if-changed=memory.x");
}
