fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    // 可复现构建优先使用 SOURCE_DATE_EPOCH
    let build_time = match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => format!("@{}", epoch.trim()),
        Err(_) => std::process::Command::new("date")
            .args(["-u", "+%Y-%m-%d %H:%M:%S UTC"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    };
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);
}
