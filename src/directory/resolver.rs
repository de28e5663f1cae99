use super::{DirectoryService, Translations, is_external_address};
use crate::error::Result;
use std::collections::HashMap;

/// Routes lookups to the directory that knows a user
///
/// `forename.name` identifiers are corporate. Short logins are looked up in
/// the legacy directory first, then through their translated corporate
/// identifier.
pub struct DirectoryResolver {
    corporate: Box<dyn DirectoryService>,
    legacy: Box<dyn DirectoryService>,
    translations: Translations,
}

impl std::fmt::Debug for DirectoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryResolver")
            .field("translations", &self.translations)
            .finish_non_exhaustive()
    }
}

impl DirectoryResolver {
    pub fn new(
        corporate: Box<dyn DirectoryService>,
        legacy: Box<dyn DirectoryService>,
        translations: Translations,
    ) -> Self {
        Self {
            corporate,
            legacy,
            translations,
        }
    }

    /// Corporate identifier of `user`, if it has one
    pub fn corporate_id(&self, user: &str) -> Option<String> {
        if user.contains('.') {
            Some(user.to_string())
        } else {
            self.translations.user(user).map(str::to_string)
        }
    }

    pub fn exists(&self, user: &str) -> Result<bool> {
        if user.contains('.') {
            return self.corporate.exists(user);
        }
        if self.legacy.exists(user)? {
            return Ok(true);
        }
        match self.translations.user(user) {
            Some(id) => self.corporate.exists(id),
            None => Ok(false),
        }
    }

    /// Directory email address of `user`
    pub fn mail(&self, user: &str) -> Result<Option<String>> {
        if user.contains('.') {
            return self.corporate.mail(user);
        }
        if self.legacy.exists(user)? {
            return self.legacy.mail(user);
        }
        match self.translations.user(user) {
            Some(id) => self.corporate.mail(id),
            None => Ok(None),
        }
    }

    /// Corporate display name of a corporate identifier
    pub fn display_name(&self, user_id: &str) -> Result<Option<String>> {
        self.corporate.display_name(user_id)
    }

    pub fn is_external(&self, user: &str) -> Result<bool> {
        Ok(self.mail(user)?.is_some_and(|mail| is_external_address(&mail)))
    }
}

/// Per-user email preference, used for people outside the directories
#[cfg_attr(test, mockall::automock)]
pub trait SpecifiedEmailStore {
    fn email_for(&self, user: &str) -> Option<String>;
}

impl SpecifiedEmailStore for HashMap<String, String> {
    fn email_for(&self, user: &str) -> Option<String> {
        self.get(user).filter(|mail| !mail.is_empty()).cloned()
    }
}

/// Email of `user`: directory first, then the user's own preference
///
/// `None` means the user is known nowhere, typically because they left.
pub fn resolve_email(
    resolver: &DirectoryResolver,
    store: &dyn SpecifiedEmailStore,
    user: &str,
) -> Result<Option<String>> {
    if let Some(mail) = resolver.mail(user)? {
        return Ok(Some(mail));
    }
    let specified = store.email_for(user);
    if specified.is_none() {
        tracing::debug!("No email address for '{}'", user);
    }
    Ok(specified)
}

/// Addresses built from a default mail domain
///
/// Old repositories record bare usernames; they are turned into
/// `name@domain`, with both parts translated to the new naming scheme.
#[derive(Debug, Clone)]
pub struct DomainEmailResolver {
    default_domain: String,
    translations: Translations,
}

impl DomainEmailResolver {
    pub fn new(default_domain: impl Into<String>, translations: Translations) -> Self {
        Self {
            default_domain: default_domain.into(),
            translations,
        }
    }

    pub fn address_for(&self, name: &str) -> Option<String> {
        if self.default_domain.is_empty() {
            return None;
        }
        let domain = self
            .translations
            .domain(&self.default_domain)
            .unwrap_or(&self.default_domain);
        let name = self.translations.user(name).unwrap_or(name);
        Some(format!("{name}@{domain}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MockDirectoryService;
    use crate::error::ArtusError;
    use mockall::predicate::eq;

    fn translations() -> Translations {
        Translations::new(
            HashMap::from([("artus.fr".to_string(), "corp.com".to_string())]),
            HashMap::from([("jdoe".to_string(), "john.doe".to_string())]),
        )
    }

    fn absent_legacy() -> MockDirectoryService {
        let mut legacy = MockDirectoryService::new();
        legacy.expect_exists().returning(|_| Ok(false));
        legacy
    }

    #[test]
    fn test_dotted_id_goes_to_corporate() {
        let mut corporate = MockDirectoryService::new();
        corporate
            .expect_mail()
            .with(eq("john.doe"))
            .returning(|_| Ok(Some("john.doe@corp.com".to_string())));
        let legacy = MockDirectoryService::new();

        let resolver = DirectoryResolver::new(Box::new(corporate), Box::new(legacy), translations());
        assert_eq!(resolver.mail("john.doe").unwrap().as_deref(), Some("john.doe@corp.com"));
    }

    #[test]
    fn test_legacy_login_found_in_legacy_directory() {
        let corporate = MockDirectoryService::new();
        let mut legacy = MockDirectoryService::new();
        legacy.expect_exists().with(eq("asmith")).returning(|_| Ok(true));
        legacy
            .expect_mail()
            .with(eq("asmith"))
            .returning(|_| Ok(Some("asmith@artus.fr".to_string())));

        let resolver = DirectoryResolver::new(Box::new(corporate), Box::new(legacy), translations());
        assert_eq!(resolver.mail("asmith").unwrap().as_deref(), Some("asmith@artus.fr"));
        assert!(resolver.exists("asmith").unwrap());
    }

    #[test]
    fn test_migrated_login_goes_through_translation() {
        let mut corporate = MockDirectoryService::new();
        corporate
            .expect_mail()
            .with(eq("john.doe"))
            .returning(|_| Ok(Some("john.doe.external@corp.com".to_string())));
        corporate.expect_exists().with(eq("john.doe")).returning(|_| Ok(true));

        let resolver =
            DirectoryResolver::new(Box::new(corporate), Box::new(absent_legacy()), translations());
        assert!(resolver.exists("jdoe").unwrap());
        assert!(resolver.is_external("jdoe").unwrap());
        assert_eq!(resolver.corporate_id("jdoe").as_deref(), Some("john.doe"));
    }

    #[test]
    fn test_unknown_login_is_absent_not_error() {
        let corporate = MockDirectoryService::new();
        let resolver =
            DirectoryResolver::new(Box::new(corporate), Box::new(absent_legacy()), translations());
        assert_eq!(resolver.mail("ghost").unwrap(), None);
        assert!(!resolver.exists("ghost").unwrap());
        assert!(!resolver.is_external("ghost").unwrap());
    }

    #[test]
    fn test_directory_failure_propagates() {
        let mut corporate = MockDirectoryService::new();
        corporate
            .expect_mail()
            .returning(|_| Err(ArtusError::Directory("connection refused".to_string())));
        let resolver =
            DirectoryResolver::new(Box::new(corporate), Box::new(absent_legacy()), translations());
        assert!(resolver.mail("john.doe").is_err());
    }

    #[test]
    fn test_resolve_email_falls_back_to_preference() {
        let resolver = DirectoryResolver::new(
            Box::new(MockDirectoryService::new()),
            Box::new(absent_legacy()),
            translations(),
        );
        let mut store = MockSpecifiedEmailStore::new();
        store
            .expect_email_for()
            .returning(|user| (user == "contractor").then(|| "c@partner.com".to_string()));

        assert_eq!(
            resolve_email(&resolver, &store, "contractor").unwrap().as_deref(),
            Some("c@partner.com")
        );
        assert_eq!(resolve_email(&resolver, &store, "gone").unwrap(), None);
    }

    #[test]
    fn test_preference_map_ignores_empty_values() {
        let store = HashMap::from([
            ("a".to_string(), "a@x.com".to_string()),
            ("b".to_string(), String::new()),
        ]);
        assert_eq!(store.email_for("a").as_deref(), Some("a@x.com"));
        assert_eq!(store.email_for("b"), None);
    }

    #[test]
    fn test_domain_email_resolver() {
        let resolver = DomainEmailResolver::new("artus.fr", translations());
        assert_eq!(resolver.address_for("jdoe").as_deref(), Some("john.doe@corp.com"));
        assert_eq!(resolver.address_for("other").as_deref(), Some("other@corp.com"));

        let disabled = DomainEmailResolver::new("", translations());
        assert_eq!(disabled.address_for("jdoe"), None);
    }
}
