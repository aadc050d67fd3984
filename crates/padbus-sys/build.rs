use std::env;
use std::path::PathBuf;

// Links the prebuilt ViGEmClient import library on Windows targets.
// Other targets only get the declarations; nothing is linked.
fn main() {
    println!("cargo:rerun-if-env-changed=PADBUS_VIGEM_LIB_DIR");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        return;
    }

    let search = match env::var_os("PADBUS_VIGEM_LIB_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let arch = match env::var("CARGO_CFG_TARGET_ARCH").as_deref() {
                Ok("x86") => "x86",
                _ => "x64",
            };
            let manifest = env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default();
            PathBuf::from(manifest).join("lib").join(arch)
        }
    };

    println!("cargo:rustc-link-search=native={}", search.display());
    println!("cargo:rustc-link-lib=ViGEmClient");
    println!("cargo:rustc-link-lib=setupapi");
}
