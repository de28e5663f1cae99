//! Project users, profiles and roles
//!
//! Permissions are `(subject, action)` pairs. A profile is an action users
//! or roles are granted; a role is a group whose members are users. Users
//! belong to a profile either directly or through one of its roles.

use crate::directory::{DirectoryResolver, SpecifiedEmailStore, resolve_email};
use crate::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Registered usernames of an htpasswd file, in file order, without
/// `special_users`
pub fn read_htpasswd(path: &Path, special_users: &[String]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b':')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_path(path)?;

    let mut seen = HashSet::new();
    let mut users = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(user) = record.get(0).map(str::trim).filter(|u| !u.is_empty()) else {
            continue;
        };
        if special_users.iter().any(|s| s == user) || !seen.insert(user.to_string()) {
            continue;
        }
        users.push(user.to_string());
    }
    tracing::debug!("{} registered users in {}", users.len(), path.display());
    Ok(users)
}

/// `john.doe` → `John DOE`; other logins are returned unchanged
pub fn formatted_name(authname: &str) -> String {
    let parts: Vec<&str> = authname.split('.').collect();
    match parts.as_slice() {
        [forename, name] => format!("{} {}", capitalize(forename), name.to_uppercase()),
        _ => authname.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

fn title_case(text: &str) -> String {
    text.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Short label of a role (`design_engineer` → `DE`)
pub fn role_initials(role: &str) -> String {
    match role {
        "program_manager" => "PgM".to_string(),
        "project_manager" => "PjM".to_string(),
        _ => title_case(&role.replace('_', " "))
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect(),
    }
}

/// Who is who in a project
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUsers {
    pub user_profiles: Vec<String>,
    pub user_roles: Vec<String>,
    pub displayed_profiles: Vec<(String, String)>,
    pub displayed_roles: Vec<(String, String)>,
    pub role_initials: BTreeMap<String, String>,
    pub roles_by_profile: BTreeMap<String, Vec<String>>,
    /// Users granted a profile directly, not through a role
    pub users_by_profile: BTreeMap<String, Vec<String>>,
    pub users_by_role: BTreeMap<String, Vec<String>>,
    pub users_with_role_by_profile: BTreeMap<String, Vec<String>>,
    pub users_without_role_by_profile: BTreeMap<String, Vec<String>>,
    pub registered_users: BTreeSet<String>,
    pub test_users: Vec<String>,
    pub project_users: BTreeSet<String>,
}

impl ProjectUsers {
    pub fn build(
        profiles: &[String],
        roles: &[String],
        permissions: &[(String, String)],
        registered: impl IntoIterator<Item = String>,
        test_users: &[String],
    ) -> Self {
        let user_profiles: Vec<String> = profiles.iter().map(|p| p.trim().to_string()).collect();
        let mut user_roles: Vec<String> = roles.iter().map(|r| r.trim().to_string()).collect();
        user_roles.sort();

        let is_profile = |s: &str| user_profiles.iter().any(|p| p == s);
        let is_role = |s: &str| user_roles.iter().any(|r| r == s);

        let subjects_of = |action: &str, keep: &dyn Fn(&str) -> bool| -> Vec<String> {
            let mut subjects: Vec<String> = permissions
                .iter()
                .filter(|(subject, granted)| granted == action && keep(subject))
                .map(|(subject, _)| subject.clone())
                .collect();
            subjects.sort();
            subjects
        };

        let mut roles_by_profile = BTreeMap::new();
        let mut users_by_profile = BTreeMap::new();
        for profile in &user_profiles {
            roles_by_profile.insert(
                profile.clone(),
                subjects_of(profile, &|s| !is_profile(s) && is_role(s)),
            );
            users_by_profile.insert(
                profile.clone(),
                subjects_of(profile, &|s| !is_profile(s) && !is_role(s)),
            );
        }

        let users_by_role: BTreeMap<String, Vec<String>> = user_roles
            .iter()
            .map(|role| (role.clone(), subjects_of(role, &|_| true)))
            .collect();

        let users_with_role_by_profile: BTreeMap<String, Vec<String>> = roles_by_profile
            .iter()
            .map(|(profile, roles): (&String, &Vec<String>)| {
                let members: BTreeSet<String> = roles
                    .iter()
                    .filter_map(|role| users_by_role.get(role))
                    .flatten()
                    .cloned()
                    .collect();
                (profile.clone(), members.into_iter().collect())
            })
            .collect();
        let users_without_role_by_profile = users_by_profile.clone();

        let project_users: BTreeSet<String> = users_with_role_by_profile
            .values()
            .chain(users_without_role_by_profile.values())
            .flatten()
            .cloned()
            .collect();

        let displayed_profiles = user_profiles
            .iter()
            .map(|p| (p.clone(), capitalize(p)))
            .collect();
        let displayed_roles = user_roles
            .iter()
            .map(|r| (r.clone(), title_case(&r.replace('_', " "))))
            .collect();
        let role_initials = user_roles
            .iter()
            .map(|r| (r.clone(), role_initials(r)))
            .collect();

        Self {
            user_profiles,
            user_roles,
            displayed_profiles,
            displayed_roles,
            role_initials,
            roles_by_profile,
            users_by_profile,
            users_by_role,
            users_with_role_by_profile,
            users_without_role_by_profile,
            registered_users: registered.into_iter().collect(),
            test_users: test_users.iter().map(|u| u.trim().to_string()).collect(),
            project_users,
        }
    }

    /// True when `user` has neither a profile nor a role yet
    pub fn user_check(&self, user: &str) -> bool {
        !self.project_users.contains(user)
    }

    /// True when `role` belongs to exactly one profile
    pub fn role_check(&self, role: &str) -> bool {
        self.roles_by_profile
            .values()
            .filter(|roles| roles.iter().any(|r| r == role))
            .count()
            == 1
    }

    /// True when `group` is a known profile or role
    pub fn group_check(&self, group: &str) -> bool {
        self.user_profiles.iter().any(|p| p == group) || self.user_roles.iter().any(|r| r == group)
    }

    /// Registered users not yet part of the project, test accounts excluded
    pub fn unassigned_users(&self) -> Vec<String> {
        self.registered_users
            .iter()
            .filter(|u| self.user_check(u) && !self.test_users.contains(u))
            .cloned()
            .collect()
    }

    /// Email of every project user; `None` for users known nowhere
    pub fn emails(
        &self,
        resolver: &DirectoryResolver,
        store: &dyn SpecifiedEmailStore,
    ) -> Result<BTreeMap<String, Option<String>>> {
        self.project_users
            .iter()
            .map(|user| Ok((user.clone(), resolve_email(resolver, store, user)?)))
            .collect()
    }
}
