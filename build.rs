fn main() {
    // Shown in the startup log line so an operator can tell which build
    // is driving the robot.
    let build_date = chrono::Utc::now()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string();
    println!("cargo:rustc-env=BUILD_DATE={}", build_date);
}
