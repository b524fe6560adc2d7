use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Substitutes `$VAR` path components from the environment.
///
/// Unset variables are left as written so resolution errors name the
/// original target.
pub fn substitute_path_variables<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut new = PathBuf::new();
    for c in path.as_ref().components() {
        if let Some(s) = c.as_os_str().to_str() {
            if let Some(name) = s.strip_prefix('$') {
                if let Ok(value) = env::var(name) {
                    new.push(value);
                    continue;
                }
            }
        }
        new.push(c.as_os_str());
    }
    new
}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<String> {
    let mut buf = String::new();
    let mut file = File::open(&path)?;
    file.read_to_string(&mut buf)?;
    Ok(buf)
}
