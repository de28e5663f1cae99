//! Skill configuration
//!
//! Skills are the engineering disciplines (SYS, HW, FW, ...) a ticket or a
//! configuration item belongs to. They are configured as conditional
//! property values of the form `k1[,k2...] -> value // k3 -> value // ...`.

use crate::error::{ArtusError, Result};
use regex::Regex;

/// Split a conditional property value into `(key, value)` pairs
///
/// Configuration order is preserved; a key listed twice keeps its last
/// value at its first position.
pub fn parse_prop_values(value: &str) -> Result<Vec<(String, String)>> {
    let mut options: Vec<(String, String)> = Vec::new();
    for (keys, target) in conditional_entries(value)? {
        for key in keys.split(',').map(str::trim) {
            match options.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = target.to_string(),
                None => options.push((key.to_string(), target.to_string())),
            }
        }
    }
    Ok(options)
}

/// Value configured for `key`, if any
pub fn prop_value(value: &str, key: &str) -> Result<Option<String>> {
    Ok(parse_prop_values(value)?
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v))
}

fn conditional_entries(value: &str) -> Result<Vec<(&str, &str)>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split("//")
        .map(|option| {
            option
                .split_once("->")
                .map(|(keys, target)| (keys.trim(), target.trim()))
                .ok_or_else(|| {
                    tracing::error!("Malformed conditional value entry '{}'", option.trim());
                    ArtusError::config(format!("malformed entry '{}'", option.trim()))
                })
        })
        .collect()
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_string()).collect()
}

/// Milestone skills compatible with a ticket skill (`HW` → `[SYS, HW]`)
///
/// Empty when the project has no skills at all.
pub fn milestone_skills(milestone_filter: &str, skill_options: &str, skill: &str) -> Result<Vec<String>> {
    if skill_options.trim().is_empty() {
        return Ok(Vec::new());
    }
    if milestone_filter.trim().is_empty() {
        tracing::error!("Bad configuration for 'milestone_filter' in milestone_skills");
        return Err(ArtusError::config("milestone_filter is empty"));
    }
    conditional_entries(milestone_filter)?
        .into_iter()
        .find(|(field_value, _)| *field_value == skill)
        .map(|(_, skills)| split_list(skills))
        .ok_or_else(|| {
            tracing::error!(
                "Skill '{}' not found in definition of 'milestone_filter' in milestone_skills",
                skill
            );
            ArtusError::config(format!("skill '{skill}' missing from milestone_filter"))
        })
}

/// Ticket skills compatible with a milestone skill (`SYS` → `[SYS, HW, FW]`)
pub fn ticket_skills(milestone_filter: &str, skill: &str) -> Result<Vec<String>> {
    if milestone_filter.trim().is_empty() {
        tracing::error!("Bad configuration for 'milestone_filter' in ticket_skills");
        return Err(ArtusError::config("milestone_filter is empty"));
    }
    let mut skills: Vec<String> = Vec::new();
    for (field_value, list) in conditional_entries(milestone_filter)? {
        if split_list(list).iter().any(|s| s == skill) && !skills.iter().any(|s| s == field_value) {
            skills.push(field_value.to_string());
        }
    }
    Ok(skills)
}

fn alternation(options: &str) -> String {
    options
        .split('|')
        .map(|s| regex::escape(s.trim()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Skill embedded in `name` (`<prefix>_<skill>_...`), else `default`
pub fn skill_of(name: &str, prefix: &str, skill_options: &str, default: &str) -> String {
    if skill_options.trim().is_empty() {
        return default.to_string();
    }
    let pattern = format!(r"\A{}_({})_", regex::escape(prefix), alternation(skill_options));
    Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(name).map(|c| c[1].to_string()))
        .unwrap_or_else(|| default.to_string())
}

/// Whether `name` belongs to a skill outside configuration management
pub fn is_unmanaged(name: &str, program: &str, unmanaged_skills: &str) -> bool {
    if unmanaged_skills.trim().is_empty() {
        return false;
    }
    let pattern = format!(r"^{}_({})_", regex::escape(program), alternation(unmanaged_skills));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(name))
}

/// Items whose skill is in `filter`, sorted
pub fn filtered_items<S: AsRef<str>>(
    items: &[S],
    filter: &[String],
    program: &str,
    skill_options: &str,
    default: &str,
) -> Vec<String> {
    let mut kept: Vec<String> = items
        .iter()
        .map(AsRef::as_ref)
        .filter(|item| filter.contains(&skill_of(item, program, skill_options, default)))
        .map(str::to_string)
        .collect();
    kept.sort();
    kept
}

/// Whether `name` carries the short code name of its skill
pub fn is_simple_component(
    name: &str,
    prefix: &str,
    skill_options: &str,
    default: &str,
    code_shortnames: &str,
) -> Result<bool> {
    let skill = skill_of(name, prefix, skill_options, default);
    let shortname = prop_value(code_shortnames, &skill)?
        .ok_or_else(|| ArtusError::config(format!("no code shortname for skill '{skill}'")))?;
    Ok(name.contains(&shortname))
}
