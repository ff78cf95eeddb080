//! Skill descriptor sources
//!
//! A source is the raw material of one descriptor: the `SKILL.md` document
//! plus every module body it references. Sources are read once, up front,
//! so the matching path never touches the filesystem.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::descriptor::parse_skill_document;
use crate::error::Result;

/// File name of a skill document inside a skill directory
pub const SKILL_FILE: &str = "SKILL.md";

/// Raw descriptor document plus referenced module bodies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillSource {
    origin: String,
    document: String,
    bodies: BTreeMap<String, String>,
}

impl SkillSource {
    /// In-memory source; `origin` is a label used in error messages and cache keys
    pub fn inline(origin: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            document: document.into(),
            bodies: BTreeMap::new(),
        }
    }

    /// Attach the content of a referenced module file
    pub fn with_body(mut self, reference: impl Into<String>, content: impl Into<String>) -> Self {
        self.bodies.insert(reference.into(), content.into());
        self
    }

    /// Read `SKILL.md` from `dir` together with every module file it references.
    ///
    /// References that cannot be read are left out; descriptor validation
    /// reports them as unresolved modules.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let skill_file = dir.join(SKILL_FILE);
        let document = fs::read_to_string(&skill_file)?;
        let mut source = Self::inline(dir.display().to_string(), document);

        // Unparseable documents are reported by descriptor validation
        let Ok((frontmatter, _)) = parse_skill_document(&source.document) else {
            return Ok(source);
        };

        for reference in frontmatter.references() {
            if !is_safe_reference(&reference) {
                warn!("Ignoring unsafe module reference {:?} in {:?}", reference, dir);
                continue;
            }
            match fs::read_to_string(dir.join(&reference)) {
                Ok(content) => {
                    source.bodies.insert(reference, content);
                }
                Err(e) => debug!("Cannot read module {:?} in {:?}: {}", reference, dir, e),
            }
        }

        Ok(source)
    }

    /// Where this source came from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The `SKILL.md` text
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Body of a referenced module file
    pub fn body(&self, reference: &str) -> Option<&str> {
        self.bodies.get(reference).map(String::as_str)
    }

    /// Stable content fingerprint of document and bodies
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.document.hash(&mut hasher);
        self.bodies.hash(&mut hasher);
        hasher.finish()
    }
}

/// Module references must stay inside the skill directory
pub(crate) fn is_safe_reference(reference: &str) -> bool {
    let path = Path::new(reference);
    !reference.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Set of directories scanned for skills
#[derive(Debug, Clone, Default)]
pub struct SkillDirectories {
    directories: Vec<PathBuf>,
}

impl SkillDirectories {
    /// Create an empty directory set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a skills directory to scan
    pub fn add_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    /// Add personal skills directory: ~/.skillgate/skills/
    pub fn with_personal_skills(self) -> Self {
        if let Some(home) = dirs::home_dir() {
            self.add_directory(home.join(".skillgate").join("skills"))
        } else {
            warn!("Could not find home directory for personal skills");
            self
        }
    }

    /// Add project skills directory: ./.skillgate/skills/
    pub fn with_project_skills(self) -> Self {
        self.add_directory(PathBuf::from(".skillgate/skills"))
    }

    /// Configured directories, in scan order
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Scan all directories and read every skill found.
    ///
    /// Subdirectories are visited in sorted order so registration order is
    /// reproducible. Missing directories are skipped.
    pub fn discover(&self) -> Result<Vec<SkillSource>> {
        info!(
            "Starting skills discovery in {} directories",
            self.directories.len()
        );

        let mut sources = Vec::new();
        for dir in &self.directories {
            if !dir.exists() {
                debug!("Skills directory does not exist: {:?}", dir);
                continue;
            }

            if !dir.is_dir() {
                warn!("Skills path is not a directory: {:?}", dir);
                continue;
            }

            scan_directory(dir, &mut sources)?;
        }

        info!("Discovered {} skill sources", sources.len());
        Ok(sources)
    }
}

fn scan_directory(dir: &Path, sources: &mut Vec<SkillSource>) -> Result<()> {
    let mut skill_dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() && path.join(SKILL_FILE).is_file() {
            skill_dirs.push(path);
        }
    }
    skill_dirs.sort();

    for path in skill_dirs {
        debug!("Reading skill at {:?}", path);
        sources.push(SkillSource::from_dir(&path)?);
    }

    Ok(())
}
