//! Tree providers for both sides of an import
//!
//! A provider turns a revision (Subversion) or commit (Git) into something a
//! comparator can read: either the text of a recursive tree listing or the
//! root of a checked-out working directory.
//!
//! Checkouts are destructive: each call moves the provider's single working
//! directory to exactly the requested state. Working directories are owned
//! by one provider for the whole run and must not be shared.

use crate::command;
use crate::error::{Result, VerifyError};
use crate::types::IgnoreSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Source side (Subversion) of a verification run
pub trait SourceProvider {
    /// Recursive listing of `branch_path` at `revision`, without `ignored`
    fn list_tree(&self, revision: &str, branch_path: &str, ignored: &IgnoreSet) -> Result<String>;

    /// Materialize `revision` and return the working directory root
    ///
    /// The root covers the whole repository; callers scope it to a branch.
    fn checkout(&mut self, revision: &str) -> Result<PathBuf>;
}

/// Target side (Git) of a verification run
pub trait TargetProvider {
    /// Recursive listing of the tree at `commit`
    fn list_tree(&self, commit: &str) -> Result<String>;

    /// Materialize `commit` and return the working directory root
    fn checkout(&mut self, commit: &str) -> Result<PathBuf>;
}

/// Numeric part of a revision token (`r42` -> `42`)
pub fn revision_number(revision: &str) -> &str {
    revision.strip_prefix('r').unwrap_or(revision)
}

/// A local Subversion repository
#[derive(Debug, Clone)]
pub struct SvnRepo {
    path: PathBuf,
    svn: OsString,
    ls_tree: OsString,
    workdir: Option<PathBuf>,
    url: Option<String>,
}

impl SvnRepo {
    /// Open the repository at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let path = path.canonicalize()?;
        Ok(Self {
            path,
            svn: "svn".into(),
            ls_tree: "svn-ls-tree".into(),
            workdir: None,
            url: None,
        })
    }

    /// Program used for tree listings
    pub fn with_ls_tree(mut self, program: impl Into<OsString>) -> Self {
        self.ls_tree = program.into();
        self
    }

    /// Subversion client used for info and checkouts
    pub fn with_svn(mut self, program: impl Into<OsString>) -> Self {
        self.svn = program.into();
        self
    }

    /// Working directory for checkouts
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Canonical repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build the listing command without running it
    pub fn list_tree_command(&self, revision: &str, branch_path: &str, ignored: &IgnoreSet) -> Command {
        let mut cmd = Command::new(&self.ls_tree);
        cmd.args(["-r", "-t", "--root", branch_path]);
        for path in ignored.iter() {
            cmd.arg("--ignore-path").arg(path);
        }
        cmd.arg(&self.path).arg(revision_number(revision));
        cmd
    }

    /// Root URL of the repository, queried once
    pub fn repository_url(&mut self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let location = format!("file://{}", self.path.display());
        let url = command::run_text(
            Command::new(&self.svn)
                .args(["info", "--non-interactive", "--show-item", "repos-root-url"])
                .arg(&location),
        )?
        .trim()
        .to_string();

        if url.is_empty() {
            return Err(VerifyError::internal(format!(
                "svn info printed no repository URL for {}",
                location
            )));
        }

        debug!("Subversion repository URL: {}", url);
        self.url = Some(url.clone());
        Ok(url)
    }

    fn workdir(&self) -> Result<PathBuf> {
        self.workdir.clone().ok_or_else(|| {
            VerifyError::InvalidConfiguration("no Subversion working directory configured".to_string())
        })
    }
}

impl SourceProvider for SvnRepo {
    fn list_tree(&self, revision: &str, branch_path: &str, ignored: &IgnoreSet) -> Result<String> {
        command::run_text(&mut self.list_tree_command(revision, branch_path, ignored))
    }

    fn checkout(&mut self, revision: &str) -> Result<PathBuf> {
        let workdir = self.workdir()?;
        let revnum = revision_number(revision);

        if workdir.join(".svn").is_dir() {
            command::run(
                Command::new(&self.svn)
                    .args(["update", "--quiet", "--non-interactive", "--ignore-externals", "--force", "-r", revnum])
                    .arg(&workdir),
            )?;
            command::run(
                Command::new(&self.svn)
                    .args(["revert", "--quiet", "--non-interactive", "-R"])
                    .arg(&workdir),
            )?;
        } else {
            let url = self.repository_url()?;
            info!("Checking out {} into {}", url, workdir.display());
            command::run(
                Command::new(&self.svn)
                    .args(["checkout", "--quiet", "--non-interactive", "--ignore-externals", "-r", revnum])
                    .arg(&url)
                    .arg(&workdir),
            )?;
        }

        Ok(workdir)
    }
}

/// A local Git repository
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
    git: OsString,
    workdir: Option<PathBuf>,
    // Set once the working directory has been cloned or fetched
    prepared: bool,
}

impl GitRepo {
    /// Open the repository at `path`
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.canonicalize()?,
            git: "git".into(),
            workdir: None,
            prepared: false,
        })
    }

    /// Git executable
    pub fn with_git(mut self, program: impl Into<OsString>) -> Self {
        self.git = program.into();
        self
    }

    /// Working directory for checkouts
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self.prepared = false;
        self
    }

    /// Canonical repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone into `workdir`, or fetch once if it already holds a clone
    fn prepare(&mut self, workdir: &Path) -> Result<()> {
        if self.prepared {
            return Ok(());
        }

        if workdir.join(".git").exists() {
            debug!("Reusing clone in {}", workdir.display());
            command::run(self.in_workdir(workdir).args(["fetch", "--quiet", "origin"]))?;
        } else {
            info!("Cloning {} into {}", self.path.display(), workdir.display());
            command::run(
                Command::new(&self.git)
                    .args(["clone", "--quiet", "--no-checkout"])
                    .arg(&self.path)
                    .arg(workdir),
            )?;
        }

        self.prepared = true;
        Ok(())
    }

    fn in_workdir(&self, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.git);
        cmd.current_dir(workdir);
        cmd
    }
}

impl TargetProvider for GitRepo {
    fn list_tree(&self, commit: &str) -> Result<String> {
        command::run_text(
            Command::new(&self.git)
                .args(["ls-tree", "-r", "-t", commit])
                .current_dir(&self.path),
        )
    }

    fn checkout(&mut self, commit: &str) -> Result<PathBuf> {
        let workdir = self.workdir.clone().ok_or_else(|| {
            VerifyError::InvalidConfiguration("no Git working directory configured".to_string())
        })?;

        self.prepare(&workdir)?;
        command::run(
            self.in_workdir(&workdir)
                .args(["checkout", "--quiet", "--force", "--detach", commit]),
        )?;
        command::run(self.in_workdir(&workdir).args(["clean", "-q", "-f", "-d", "-x"]))?;

        Ok(workdir)
    }
}
