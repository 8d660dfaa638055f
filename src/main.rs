//! Host-side helper: `cargo run` builds the WASM site with wasm-pack and
//! serves `static/` locally.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use std::process::{Command, Stdio};

    use anyhow::{bail, Context};
    use log::{info, warn};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port = std::env::var("LOADER_PORT").unwrap_or_else(|_| "8000".to_owned());

    info!("building WASM pkg");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(st) => bail!("wasm-pack finished with {st}"),
        Err(err) => warn!("wasm-pack not runnable ({err}); serving whatever is in static/pkg"),
    }

    info!("serving static/ at http://127.0.0.1:{port}");
    let status = Command::new("python3")
        .args(["-m", "http.server", &port, "--directory", "static"])
        .stdout(Stdio::null())
        .status()
        .context("failed to start http server")?;
    if !status.success() {
        bail!("http server exited with {status}");
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
