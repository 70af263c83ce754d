use std::process::Command;

/// Run git, returning trimmed stdout on success.
fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    // Stamped into the startup log line of the server binary.
    let build_id = match git(&["rev-parse", "--short", "HEAD"]) {
        Some(hash) if git(&["diff", "--quiet"]).is_none() => format!("{hash}-dirty"),
        Some(hash) => hash,
        None => "unknown".to_string(),
    };

    println!("cargo:rustc-env=GIT_HASH={build_id}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}
