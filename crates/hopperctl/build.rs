// Build script for hopperctl - embeds version at compile time

fn main() {
    let version =
        std::env::var("HOPPER_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=HOPPER_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=HOPPER_VERSION");
}
