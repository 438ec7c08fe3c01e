//! Sample cast tables and test doubles shared by the processor tests

use crate::driver::{PivotInvocation, PivotTool, ToolOutput};
use crate::error::{Result, UnxtabError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Pre-2016 downcast: pressure at column 8 of the source (11 once
/// provenance is prepended), two metadata rows and one unassigned row
pub const LEGACY_DOWNCAST: &str = "\
Station,Cast,Date,Time,Latitude,Longitude,Bottom,Pressure,Depth,Temperature,Salinity
,,,,,,,db,m,degC,PSU
,,,,,,,raw,raw,qc,qc
P4,1,2014-07-01,10:00,47.6,-122.4,120,1.0,1.0,12.1,29.8
None,1,2014-07-01,10:01,47.6,-122.4,120,2.0,2.0,12.0,29.9
P4,1,2014-07-01,10:02,47.6,-122.4,120,3.0,3.0,11.9,30.0
";

/// Legacy table whose pressure column was renamed by hand
pub const LEGACY_WITHOUT_PRESSURE: &str = "\
Station,Cast,Date,Time,Latitude,Longitude,Bottom,Pres,Depth,Temperature,Salinity
,,,,,,,db,m,degC,PSU
,,,,,,,raw,raw,qc,qc
P4,1,2014-07-01,10:00,47.6,-122.4,120,1.0,1.0,12.1,29.8
";

/// Spreadsheet-era downcast with padded headers, one metadata row and a
/// blank separator row
pub const MODERN_DOWNCAST: &str = "\
Station , Cast ,Date,Time,Latitude,Longitude,Bottom,Instrument,Cruise,Vessel,prDM: Pressure  Digiquartz,depSM: Depth,t090C: Temperature
,,,,,,,,,,db,m,ITS-90
P4 ,2,2019-07-01,10:00,47.6,-122.4,120,SBE911,RC0019,Carson,1.0,1.0,12.1
,,,,,,,,,,,,
None,2,2019-07-01,10:01,47.6,-122.4,120,SBE911,RC0019,Carson,2.0,2.0,12.0
P4,2,2019-07-01,10:02,47.6,-122.4,120,SBE911,RC0019,Carson,3.0,3.0,11.9
";

/// Write `contents` to `dir/name`, creating `dir`
pub fn write_cast(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Pivot tool double that records invocations and answers with a fixed
/// exit code, or fails to launch when no code is given
pub struct RecordingTool {
    exit_code: Option<i32>,
    pub invocations: Mutex<Vec<PivotInvocation>>,
}

impl RecordingTool {
    pub fn exiting_with(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn unlaunchable() -> Self {
        Self {
            exit_code: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PivotInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl PivotTool for RecordingTool {
    fn run(&self, invocation: &PivotInvocation) -> Result<ToolOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());

        match self.exit_code {
            Some(code) => Ok(ToolOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: if code == 0 {
                    String::new()
                } else {
                    "bad config".to_string()
                },
            }),
            None => Err(UnxtabError::ToolLaunch {
                program: PathBuf::from("/missing/un-xtab.py"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
        }
    }
}
