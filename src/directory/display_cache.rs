//! Cached display names of registered users
//!
//! Querying the directories for every registered user is slow, so the
//! results are kept in an INI file next to the access-right files. The file
//! records a SHA-256 fingerprint of the htpasswd file, the translation file
//! and the directory exports it was built from, and is rebuilt whenever that
//! fingerprint changes.

use super::{DirectoryResolver, LoginType, SpecifiedEmailStore, resolve_email};
use crate::config::DirectorySettings;
use crate::error::Result;
use crate::storage::{FileLock, tmp_path_for};
use crate::users::read_htpasswd;
use config::{File, FileFormat};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

const META_SECTION: &str = "meta";
const NAMES_SECTION: &str = "user-display";

#[derive(Debug, Clone)]
pub struct DisplayNameCache {
    path: PathBuf,
    htpasswd_file: PathBuf,
    translation_file: PathBuf,
    directory_files: Vec<PathBuf>,
    special_users: Vec<String>,
    login_type: LoginType,
}

#[derive(Debug, Default)]
struct CacheContents {
    fingerprint: Option<String>,
    names: Vec<(String, String)>,
}

impl DisplayNameCache {
    pub fn new(path: impl Into<PathBuf>, htpasswd_file: impl Into<PathBuf>, translation_file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            htpasswd_file: htpasswd_file.into(),
            translation_file: translation_file.into(),
            directory_files: Vec::new(),
            special_users: Vec::new(),
            login_type: LoginType::default(),
        }
    }

    pub fn from_settings(settings: &DirectorySettings) -> Self {
        Self::new(
            &settings.display_names_file,
            &settings.htpasswd_file,
            &settings.translation_file,
        )
        .with_directory_files(vec![
            settings.corporate_directory_file.clone(),
            settings.legacy_directory_file.clone(),
        ])
        .with_special_users(settings.htpasswd_special_users.clone())
        .with_login_type(settings.login_type)
    }

    /// Directory exports the display names are read from
    #[must_use]
    pub fn with_directory_files(mut self, directory_files: Vec<PathBuf>) -> Self {
        self.directory_files = directory_files;
        self
    }

    /// Service accounts never listed
    #[must_use]
    pub fn with_special_users(mut self, special_users: Vec<String>) -> Self {
        self.special_users = special_users;
        self
    }

    #[must_use]
    pub const fn with_login_type(mut self, login_type: LoginType) -> Self {
        self.login_type = login_type;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fingerprint of the current source files
    ///
    /// A missing translation file or directory export counts as empty.
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(std::fs::read(&self.htpasswd_file)?);
        for path in std::iter::once(&self.translation_file).chain(&self.directory_files) {
            let content = match std::fs::read(path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => return Err(e.into()),
            };
            // length prefix keeps bytes from sliding between files
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(content);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Whether the cache file matches the current source files
    pub fn is_fresh(&self) -> Result<bool> {
        let current = self.fingerprint()?;
        Ok(self.read()?.fingerprint.as_deref() == Some(current.as_str()))
    }

    /// `(username, display name)` pairs usable by this project, sorted by
    /// display name
    ///
    /// The cache is rebuilt first when stale.
    pub fn names(
        &self,
        resolver: &DirectoryResolver,
        store: &dyn SpecifiedEmailStore,
    ) -> Result<Vec<(String, String)>> {
        {
            let _lock = FileLock::acquire(&self.path)?;
            let current = self.fingerprint()?;
            if self.read()?.fingerprint.as_deref() != Some(current.as_str()) {
                tracing::info!("Display-name cache {} is stale, regenerating", self.path.display());
                self.generate(resolver, store, &current)?;
            }
        }

        let mut names: Vec<(String, String)> = self
            .read()?
            .names
            .into_iter()
            .filter(|(username, _)| self.login_type.accepts(username))
            .collect();
        names.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(names)
    }

    /// Rebuild the cache unconditionally; returns the number of entries
    pub fn regenerate(&self, resolver: &DirectoryResolver, store: &dyn SpecifiedEmailStore) -> Result<usize> {
        let _lock = FileLock::acquire(&self.path)?;
        let fingerprint = self.fingerprint()?;
        self.generate(resolver, store, &fingerprint)
    }

    fn generate(
        &self,
        resolver: &DirectoryResolver,
        store: &dyn SpecifiedEmailStore,
        fingerprint: &str,
    ) -> Result<usize> {
        let users = read_htpasswd(&self.htpasswd_file, &self.special_users)?;
        let mut names = Vec::with_capacity(users.len());
        for username in users {
            let display = display_name_for(resolver, store, &username)?;
            names.push((username, display));
        }
        self.write(fingerprint, &names)?;
        Ok(names.len())
    }

    fn read(&self) -> Result<CacheContents> {
        if !self.path.exists() {
            return Ok(CacheContents::default());
        }
        let mut sections = config::Config::builder()
            .add_source(File::from(self.path.as_path()).format(FileFormat::Ini))
            .build()?
            .try_deserialize::<HashMap<String, HashMap<String, String>>>()?;

        let fingerprint = sections
            .get_mut(META_SECTION)
            .and_then(|meta| meta.remove("fingerprint"));
        let names = sections
            .remove(NAMES_SECTION)
            .map(|names| names.into_iter().collect())
            .unwrap_or_default();
        Ok(CacheContents { fingerprint, names })
    }

    fn write(&self, fingerprint: &str, names: &[(String, String)]) -> Result<()> {
        let mut text = String::new();
        let _ = writeln!(text, "[{META_SECTION}]");
        let _ = writeln!(text, "fingerprint = {fingerprint}");
        let _ = writeln!(text, "generated_at = {}", chrono::Utc::now().to_rfc3339());
        let _ = writeln!(text);
        let _ = writeln!(text, "[{NAMES_SECTION}]");
        for (username, display) in names {
            let _ = writeln!(text, "{username} = {display}");
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = tmp_path_for(&self.path);
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!("Wrote {} display names to {}", names.len(), self.path.display());
        Ok(())
    }
}

/// Directory display name of `username`, the username itself as fallback
fn display_name_for(
    resolver: &DirectoryResolver,
    store: &dyn SpecifiedEmailStore,
    username: &str,
) -> Result<String> {
    let Some(mail) = resolve_email(resolver, store, username)? else {
        return Ok(username.to_string());
    };
    let user_id = mail.split('@').next().unwrap_or_default();
    match resolver.display_name(user_id) {
        Ok(Some(name)) => {
            let name = transliterate(&name);
            Ok(if name.trim().is_empty() { username.to_string() } else { name })
        },
        Ok(None) => Ok(username.to_string()),
        Err(e) => {
            tracing::warn!("Display name lookup failed for '{}': {}", user_id, e);
            Ok(username.to_string())
        },
    }
}

/// ASCII rendering of a name: accents are dropped, ligatures spelled out,
/// anything else outside ASCII removed
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        let replacement = match c {
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
            'Æ' => "AE",
            'æ' => "ae",
            'Ç' | 'Ć' | 'Č' => "C",
            'ç' | 'ć' | 'č' => "c",
            'Ð' | 'Ď' => "D",
            'ð' | 'ď' => "d",
            'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
            'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
            'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' => "I",
            'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
            'Ł' => "L",
            'ł' => "l",
            'Ñ' | 'Ń' | 'Ň' => "N",
            'ñ' | 'ń' | 'ň' => "n",
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
            'Œ' => "OE",
            'œ' => "oe",
            'Ř' => "R",
            'ř' => "r",
            'Ś' | 'Š' | 'Ş' => "S",
            'ś' | 'š' | 'ş' => "s",
            'ß' => "ss",
            'Ť' | 'Ţ' => "T",
            'ť' | 'ţ' => "t",
            'Þ' => "TH",
            'þ' => "th",
            'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
            'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
            'Ý' | 'Ÿ' => "Y",
            'ý' | 'ÿ' => "y",
            'Ź' | 'Ż' | 'Ž' => "Z",
            'ź' | 'ż' | 'ž' => "z",
            _ => "",
        };
        out.push_str(replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{MockDirectoryService, StaticDirectory, Translations};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        cache: DisplayNameCache,
        htpasswd: PathBuf,
    }

    fn fixture(login_type: LoginType) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let htpasswd = temp_dir.path().join("htpasswd");
        std::fs::write(&htpasswd, "trac:x\njohn.doe:x\nhelene.leger:x\njdoe:x\nghost.user:x\n").unwrap();
        let cache = DisplayNameCache::new(
            temp_dir.path().join("display-names.conf"),
            &htpasswd,
            temp_dir.path().join("translation.conf"),
        )
        .with_special_users(vec!["trac".to_string()])
        .with_login_type(login_type);
        Fixture {
            _temp_dir: temp_dir,
            cache,
            htpasswd,
        }
    }

    fn resolver(lookups: Arc<AtomicUsize>) -> DirectoryResolver {
        let mut corporate = MockDirectoryService::new();
        corporate.expect_mail().returning(|user| {
            Ok(match user {
                "john.doe" | "helene.leger" => Some(format!("{user}@corp.com")),
                _ => None,
            })
        });
        corporate.expect_display_name().returning(move |user| {
            lookups.fetch_add(1, Ordering::SeqCst);
            Ok(match user {
                "john.doe" => Some("Doe John".to_string()),
                "helene.leger" => Some("Léger Hélène".to_string()),
                _ => None,
            })
        });
        let mut legacy = MockDirectoryService::new();
        legacy.expect_exists().returning(|user| Ok(user == "jdoe"));
        legacy.expect_mail().returning(|_| Ok(None));
        DirectoryResolver::new(Box::new(corporate), Box::new(legacy), Translations::default())
    }

    #[test]
    fn test_transliterate() {
        assert_eq!(transliterate("Léger Hélène"), "Leger Helene");
        assert_eq!(transliterate("Strauß Œdipe"), "Strauss OEdipe");
        assert_eq!(transliterate("Doe 李"), "Doe ");
    }

    #[test]
    fn test_names_generated_and_filtered_by_login_type() {
        let fixture = fixture(LoginType::ForenameName);
        let store: HashMap<String, String> = HashMap::new();
        let names = fixture
            .cache
            .names(&resolver(Arc::new(AtomicUsize::new(0))), &store)
            .unwrap();

        assert_eq!(
            names,
            vec![
                ("john.doe".to_string(), "Doe John".to_string()),
                ("helene.leger".to_string(), "Leger Helene".to_string()),
                ("ghost.user".to_string(), "ghost.user".to_string()),
            ]
        );
        assert!(fixture.cache.is_fresh().unwrap());
    }

    #[test]
    fn test_fname_projects_only_see_short_logins() {
        let fixture = fixture(LoginType::Fname);
        let store: HashMap<String, String> = HashMap::new();
        let names = fixture
            .cache
            .names(&resolver(Arc::new(AtomicUsize::new(0))), &store)
            .unwrap();
        assert_eq!(names, vec![("jdoe".to_string(), "jdoe".to_string())]);
    }

    #[test]
    fn test_cache_reused_until_sources_change() {
        let fixture = fixture(LoginType::ForenameName);
        let store: HashMap<String, String> = HashMap::new();
        let lookups = Arc::new(AtomicUsize::new(0));
        let resolver = resolver(Arc::clone(&lookups));

        fixture.cache.names(&resolver, &store).unwrap();
        let first = lookups.load(Ordering::SeqCst);
        assert!(first > 0);

        fixture.cache.names(&resolver, &store).unwrap();
        assert_eq!(lookups.load(Ordering::SeqCst), first);

        std::fs::write(&fixture.htpasswd, "john.doe:x\n").unwrap();
        assert!(!fixture.cache.is_fresh().unwrap());
        let names = fixture.cache.names(&resolver, &store).unwrap();
        assert_eq!(names.len(), 1);
        assert!(lookups.load(Ordering::SeqCst) > first);
    }

    #[test]
    fn test_cache_follows_directory_export_changes() {
        let temp_dir = TempDir::new().unwrap();
        let htpasswd = temp_dir.path().join("htpasswd");
        std::fs::write(&htpasswd, "john.doe:x\n").unwrap();
        let export = temp_dir.path().join("corporate.csv");
        std::fs::write(&export, "user_id,mail,display_name\njohn.doe,john.doe@corp.com,Doe John\n").unwrap();
        let cache = DisplayNameCache::new(
            temp_dir.path().join("display-names.conf"),
            &htpasswd,
            temp_dir.path().join("translation.conf"),
        )
        .with_directory_files(vec![export.clone(), temp_dir.path().join("legacy.csv")]);
        let store: HashMap<String, String> = HashMap::new();
        let resolver_for = |path: &Path| {
            DirectoryResolver::new(
                Box::new(StaticDirectory::load(path).unwrap()),
                Box::new(StaticDirectory::default()),
                Translations::default(),
            )
        };

        let names = cache.names(&resolver_for(&export), &store).unwrap();
        assert_eq!(names, vec![("john.doe".to_string(), "Doe John".to_string())]);

        std::fs::write(&export, "user_id,mail,display_name\njohn.doe,john.doe@corp.com,Doe Johnny\n").unwrap();
        assert!(!cache.is_fresh().unwrap());
        let names = cache.names(&resolver_for(&export), &store).unwrap();
        assert_eq!(names, vec![("john.doe".to_string(), "Doe Johnny".to_string())]);
    }

    #[test]
    fn test_regenerate_counts_entries() {
        let fixture = fixture(LoginType::ForenameName);
        let store: HashMap<String, String> = HashMap::new();
        let count = fixture
            .cache
            .regenerate(&resolver(Arc::new(AtomicUsize::new(0))), &store)
            .unwrap();
        assert_eq!(count, 4);
        let content = std::fs::read_to_string(fixture.cache.path()).unwrap();
        assert!(content.starts_with("[meta]\nfingerprint = "));
        assert!(content.contains("generated_at = "));
        assert!(content.contains("[user-display]\njohn.doe = Doe John\n"));
    }
}
