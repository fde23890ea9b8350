use crate::models::batch::Batch;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Every batch logs to this file inside the output directory. Parallel batches share it.
pub const LOG_FILE_NAME: &str = "emulog.txt";

/// Play every dump twice. Some merge/interlace dumps draw nothing on their first pass.
pub const LOOP_COUNT: u32 = 2;

// ref: pcsx2-gsrunner -help
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Args {
    executable: PathBuf,  // required
    dump_source: PathBuf, // required - directory the runner scans for dumps
    output_dir: PathBuf,  // required
    batch: Batch,         // required
    pub renderer: Option<String>,     // optional
    pub upscale: f64,                 // optional - 1.0 leaves the runner default alone
    pub render_hacks: Option<String>, // optional
}

impl Args {
    pub fn new(
        executable: impl AsRef<Path>,
        dump_source: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        batch: Batch,
    ) -> Self {
        Args {
            executable: executable.as_ref().to_path_buf(),
            dump_source: dump_source.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            batch,
            renderer: None,
            upscale: 1.0,
            render_hacks: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Option<String>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_upscale(mut self, upscale: f64) -> Self {
        self.upscale = upscale;
        self
    }

    pub fn with_render_hacks(mut self, render_hacks: Option<String>) -> Self {
        self.render_hacks = render_hacks;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn batch(&self) -> Batch {
        self.batch
    }

    pub fn log_file(&self) -> PathBuf {
        self.output_dir.join(LOG_FILE_NAME)
    }

    /// Arguments passed after the executable. The runner parses them positionally in places,
    /// so the order here matters.
    pub fn create_arg_list(&self) -> Vec<OsString> {
        let mut col: Vec<OsString> = vec![
            "-batch".into(),
            "-nbatches".into(),
            self.batch.count().to_string().into(),
            "-batch-id".into(),
            self.batch.id().to_string().into(),
        ];

        if let Some(renderer) = &self.renderer {
            col.push("-renderer".into());
            col.push(renderer.into());
        }

        // exact comparison, anything else is an explicit request
        if self.upscale != 1.0 {
            col.push("-upscale".into());
            col.push(format_upscale(self.upscale).into());
        }

        if let Some(hacks) = &self.render_hacks {
            col.push("-renderhacks".into());
            col.push(hacks.into());
        }

        col.push("-dumpdir".into());
        col.push(self.output_dir.clone().into_os_string());
        col.push("-logfile".into());
        col.push(self.log_file().into_os_string());

        col.push("-loop".into());
        col.push(LOOP_COUNT.to_string().into());

        // parallel runners sharing one shader cache hit sharing violations
        if self.batch.is_parallel() {
            col.push("-noshadercache".into());
        }

        // no windows popping up during automated runs
        col.push("-surfaceless".into());

        // dump source must be the very last argument
        col.push("--".into());
        col.push(self.dump_source.clone().into_os_string());

        col
    }

    /// Full argument vector including the executable, as the child sees it.
    pub fn command_line(&self) -> Vec<OsString> {
        let mut col = vec![self.executable.clone().into_os_string()];
        col.extend(self.create_arg_list());
        col
    }
}

// Same text a Python float prints: "2.0" for whole numbers, and a signed exponent with at least
// two digits ("1e+16", "1e-05") once the value goes exponential.
fn format_upscale(upscale: f64) -> String {
    let repr = format!("{upscale:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}
