//! Command execution for a deployment

use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::deploy::lock::LockHandle;
use crate::errors::ConfigError;
use crate::filesys::file::File;
use crate::models::deployment::DeploymentConfig;

/// Environment handed to the command.
///
/// The configured overrides are concatenated with themselves and nothing is
/// inherited from the server process. Duplicate keys resolve to the last
/// occurrence, so the effective environment equals the override list.
pub fn prepare_env(config: &DeploymentConfig) -> Vec<String> {
    let mut env = Vec::with_capacity(config.env.len() * 2);
    env.extend(config.env.iter().cloned());
    env.extend(config.env.iter().cloned());
    env
}

fn build_command(config: &DeploymentConfig) -> Result<Command, ConfigError> {
    let (program, args) = config
        .commands
        .split_first()
        .ok_or_else(|| ConfigError::ExecutionError("No command configured".to_string()))?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&config.run_dir)
        .env_clear()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for entry in prepare_env(config) {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                cmd.env(key, value);
            }
            _ => warn!("Ignoring malformed env entry in {}: {}", config.config_name, entry),
        }
    }

    Ok(cmd)
}

async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize> {
    match reader {
        Some(r) => r.read(buf).await,
        None => Ok(0),
    }
}

/// Collect stdout and stderr into one buffer in the order chunks arrive
async fn read_streams(child: &mut Child, output: &mut Vec<u8>) -> io::Result<()> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_buf = [0u8; 4096];
    let mut err_buf = [0u8; 4096];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            n = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match n? {
                0 => stdout = None,
                n => output.extend_from_slice(&out_buf[..n]),
            },
            n = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match n? {
                0 => stderr = None,
                n => output.extend_from_slice(&err_buf[..n]),
            },
        }
    }
    Ok(())
}

/// Kill and reap a child whose output could not be read.
///
/// Returns only once the process is gone, so the caller may release the lock.
async fn abandon(mut child: Child, err: io::Error) -> io::Error {
    warn!("Cannot read command output, killing it: {}", err);
    if let Err(e) = child.start_kill() {
        warn!("Cannot kill command: {}", e);
    }
    if let Err(e) = child.wait().await {
        warn!("Cannot reap command: {}", e);
    }
    err
}

/// Wait for the child and return its exit status with the combined output
async fn combined_output(mut child: Child) -> io::Result<(ExitStatus, Vec<u8>)> {
    let mut output = Vec::new();
    if let Err(e) = read_streams(&mut child, &mut output).await {
        return Err(abandon(child, e).await);
    }

    let status = child.wait().await?;
    Ok((status, output))
}

async fn append_log(config: &DeploymentConfig, output: &[u8]) {
    let Some(log_file) = &config.log_file else {
        return;
    };
    let file = File::new(config.run_dir.join(log_file));
    if let Err(e) = file.append_bytes(output).await {
        warn!("Cannot write log {}: {}", file.path().display(), e);
    }
}

/// Run the configured command while holding `lock`.
///
/// The lock is released as soon as the child exits, whatever the outcome.
/// Returns the combined output on success.
pub async fn run(config: &DeploymentConfig, lock: LockHandle) -> Result<String, ConfigError> {
    info!("Executing {}", config.commands.join(" "));
    debug!("Holding {}", lock.path().display());

    let result = match build_command(config) {
        Ok(mut cmd) => match cmd.spawn() {
            Ok(child) => combined_output(child).await,
            Err(e) => Err(e),
        },
        Err(e) => {
            lock.release();
            return Err(e);
        }
    };
    lock.release();

    let (status, output) = match result {
        Ok(done) => done,
        Err(e) => {
            let msg = format!("Cannot run {}: {}", config.commands.join(" "), e);
            warn!("Error during execution: {}", msg);
            return Err(ConfigError::ExecutionError(msg));
        }
    };

    append_log(config, &output).await;
    let output = String::from_utf8_lossy(&output).into_owned();

    if !status.success() {
        warn!("Error during execution ({}):\n{}", status, output);
        return Err(ConfigError::ExecutionError(output));
    }

    info!("Executed {}:\n{}", config.config_name, output);
    Ok(output)
}
