use std::io::Write;

use crate::config::BuildConfig;
use crate::core::BuildJob;
use crate::engine::{CompileRequest, render_args};
use crate::{BenchError, BenchResult};

/// Print the build matrix without running anything.
pub fn run(config: BuildConfig, json: bool) -> BenchResult<()> {
    let out_dir = config
        .out_dir
        .clone()
        .unwrap_or_else(|| std::path::PathBuf::from("<out-dir>"));
    let jobs = config.matrix(&out_dir).generate()?;
    let compiler = config.compiler()?;

    let text = if json {
        let mut s = serde_json::to_string_pretty(&jobs)?;
        s.push('\n');
        s
    } else {
        render_jobs(&jobs, |job| {
            let args = render_args(compiler.args_template(), &CompileRequest::from_job(job));
            let joined = shlex::try_join(args.iter().map(String::as_str))
                .unwrap_or_else(|_| args.join(" "));
            format!("{} {}", compiler.program().display(), joined)
        })
    };

    std::io::stdout()
        .lock()
        .write_all(text.as_bytes())
        .map_err(|e| BenchError::Message(format!("failed to write matrix: {e}")))
}

fn render_jobs(jobs: &[BuildJob], command: impl Fn(&BuildJob) -> String) -> String {
    let mut out = String::new();
    out.push_str("| # | Job | Selector | Command |\n|---|-----|----------|---------|\n");
    for (i, job) in jobs.iter().enumerate() {
        out.push_str(&format!(
            "| {} | {} | `{}` | `{}` |\n",
            i + 1,
            job.label(),
            job.selector,
            command(job)
        ));
    }
    out.push_str(&format!("\n{} jobs\n", jobs.len()));
    out
}
