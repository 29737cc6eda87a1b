//! Expansion of `%DOMAIN::NAME%` references over pluggable domains.
//!
//! Rule definitions may embed references to environment variables, well-known
//! folders, process identity strings, and configuration-supplied definitions.
//! The resolver expands them, caches successful single-reference lookups, and
//! detects reference cycles.
//!
//! A resolver is owned by the building phase of a director and dropped once
//! the director is finalized, so its caches are only ever mutated on the cold
//! configuration path and never shared across threads.

mod environment;

use std::collections::HashMap;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};

use crate::error::{PathwinderError, Result};
use crate::path_utils::AsciiCaseKey;

pub use environment::{Environment, SystemEnvironment};

#[cfg(test)]
pub(crate) use environment::mock::MockEnvironment;

/// Reference domain for process- and host-identifying strings.
pub const DOMAIN_BUILTIN: &str = "BUILTIN";
/// Reference domain for configuration-supplied definitions.
pub const DOMAIN_CONFIGURED_DEFINITION: &str = "CONF";
/// Reference domain for environment variables.
pub const DOMAIN_ENVIRONMENT_VARIABLE: &str = "ENV";
/// Reference domain for well-known system folders.
pub const DOMAIN_KNOWN_FOLDER: &str = "FOLDERID";

/// Domain used when a reference omits the `DOMAIN::` part.
pub const DEFAULT_DOMAIN: &str = DOMAIN_ENVIRONMENT_VARIABLE;

/// Upper bound on the length of an expansion result.
pub const MAX_RESOLVED_LENGTH: usize = 2048;

/// Default escape sequence emitted before an escaped character.
pub const DEFAULT_ESCAPE_SEQUENCE_START: &str = "\\";
/// Default escape sequence emitted after an escaped character.
pub const DEFAULT_ESCAPE_SEQUENCE_END: &str = "";

/// Delimiter between the domain and name parts of a reference.
const DOMAIN_DELIMITER: &str = "::";
/// Delimiter between literal and reference portions of a string.
const REFERENCE_DELIMITER: char = '%';

/// Signature of a resolver function for a registered custom domain.
pub type DomainResolverFn = Box<dyn Fn(&str) -> Result<String>>;

/// Expands references of the form `[DOMAIN::]NAME` and strings that embed
/// them between `%` delimiters.
pub struct Resolver<E: Environment = SystemEnvironment> {
    environment: E,
    definitions: IndexMap<AsciiCaseKey, String>,
    single_reference_cache: HashMap<AsciiCaseKey, String>,
    resolutions_in_progress: IndexSet<AsciiCaseKey>,
    custom_domains: IndexMap<AsciiCaseKey, DomainResolverFn>,
}

impl Default for Resolver<SystemEnvironment> {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver<SystemEnvironment> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_environment(SystemEnvironment)
    }
}

impl<E: Environment> Resolver<E> {
    #[must_use]
    pub fn with_environment(environment: E) -> Self {
        Self {
            environment,
            definitions: IndexMap::new(),
            single_reference_cache: HashMap::new(),
            resolutions_in_progress: IndexSet::new(),
            custom_domains: IndexMap::new(),
        }
    }

    /// Replaces the configuration-supplied definitions backing the `CONF`
    /// domain. Invalidates the single-reference cache.
    pub fn set_definitions<I, K, V>(&mut self, definitions: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.definitions = definitions
            .into_iter()
            .map(|(name, value)| (AsciiCaseKey::new(name.as_ref()), value.into()))
            .collect();
        self.single_reference_cache.clear();
    }

    /// Removes all configuration-supplied definitions and invalidates the
    /// single-reference cache.
    pub fn clear_definitions(&mut self) {
        self.definitions.clear();
        self.single_reference_cache.clear();
    }

    /// Registers a resolver function for a custom domain. Built-in domains
    /// take precedence over registrations with the same name.
    pub fn register_domain(&mut self, domain: &str, resolver_fn: DomainResolverFn) {
        self.custom_domains
            .insert(AsciiCaseKey::new(domain), resolver_fn);
    }

    /// Resolves a single reference of the form `[DOMAIN::]NAME`. With the
    /// domain omitted, [`DEFAULT_DOMAIN`] is used. Successful results are
    /// cached, keyed on the reference text.
    ///
    /// # Errors
    /// Returns an error for an unparseable reference, an unrecognized domain
    /// or name, a failed probe, or a reference cycle.
    pub fn resolve_single_reference(&mut self, reference: &str) -> Result<String> {
        let cache_key = AsciiCaseKey::new(reference);
        if let Some(cached) = self.single_reference_cache.get(&cache_key) {
            return Ok(cached.clone());
        }

        let parts: Vec<&str> = reference.split(DOMAIN_DELIMITER).collect();
        let (domain, name) = match parts.as_slice() {
            [name] => (DEFAULT_DOMAIN, *name),
            [domain, name] => (*domain, *name),
            _ => {
                return Err(PathwinderError::UnparseableReference {
                    reference: reference.to_string(),
                });
            }
        };

        let qualified = format!("{domain}{DOMAIN_DELIMITER}{name}");
        let in_progress_key = AsciiCaseKey::new(&qualified);
        if !self.resolutions_in_progress.insert(in_progress_key.clone()) {
            let mut chain: Vec<String> = self
                .resolutions_in_progress
                .iter()
                .map(|key| key.as_str().to_string())
                .collect();
            chain.push(in_progress_key.as_str().to_string());
            return Err(PathwinderError::CircularReference {
                reference: qualified,
                chain,
            });
        }
        let result = self.dispatch(domain, name);
        self.resolutions_in_progress.shift_remove(&in_progress_key);

        let value = result?;
        self.single_reference_cache.insert(cache_key, value.clone());
        Ok(value)
    }

    /// Expands every `%`-delimited reference embedded in `text`. `%%` emits a
    /// literal `%`.
    ///
    /// # Errors
    /// Returns an error for unmatched `%` delimiters, any failing embedded
    /// reference, or an over-length result.
    pub fn resolve_all_references(&mut self, text: &str) -> Result<String> {
        self.resolve_all_references_with_escape(
            text,
            "",
            DEFAULT_ESCAPE_SEQUENCE_START,
            DEFAULT_ESCAPE_SEQUENCE_END,
        )
    }

    /// Expands every `%`-delimited reference embedded in `text`, wrapping any
    /// character of `escape_characters` that occurs in a reference's
    /// expansion (literal portions are untouched) with `escape_start` and
    /// `escape_end`.
    ///
    /// # Errors
    /// Returns an error for unmatched `%` delimiters, any failing embedded
    /// reference, or an over-length result.
    pub fn resolve_all_references_with_escape(
        &mut self,
        text: &str,
        escape_characters: &str,
        escape_start: &str,
        escape_end: &str,
    ) -> Result<String> {
        let parts: Vec<&str> = text.split(REFERENCE_DELIMITER).collect();
        if parts.len() % 2 != 1 {
            return Err(PathwinderError::UnmatchedReferenceDelimiters {
                text: text.to_string(),
            });
        }

        let mut resolved = String::from(parts[0]);
        let mut index = 1;
        while index < parts.len() {
            let reference = parts[index];
            if reference.is_empty() {
                resolved.push(REFERENCE_DELIMITER);
            } else {
                let value = self.resolve_single_reference(reference).map_err(|source| {
                    PathwinderError::ReferenceExpansion {
                        text: text.to_string(),
                        source: Box::new(source),
                    }
                })?;
                if escape_characters.is_empty() {
                    resolved.push_str(&value);
                } else {
                    for ch in value.chars() {
                        if escape_characters.contains(ch) {
                            resolved.push_str(escape_start);
                            resolved.push(ch);
                            resolved.push_str(escape_end);
                        } else {
                            resolved.push(ch);
                        }
                    }
                }
            }
            resolved.push_str(parts[index + 1]);
            index += 2;
        }

        if resolved.len() > MAX_RESOLVED_LENGTH {
            return Err(PathwinderError::ResolvedStringTooLong {
                text: text.to_string(),
                limit: MAX_RESOLVED_LENGTH,
            });
        }
        Ok(resolved)
    }

    fn dispatch(&mut self, domain: &str, name: &str) -> Result<String> {
        match domain.to_ascii_lowercase().as_str() {
            "builtin" => self.resolve_builtin(name),
            "conf" => self.resolve_configured_definition(name),
            "env" => self.environment.env_var(name).ok_or_else(|| {
                PathwinderError::ReferenceUnavailable {
                    domain: DOMAIN_ENVIRONMENT_VARIABLE.to_string(),
                    name: name.to_string(),
                }
            }),
            "folderid" => self.environment.known_folder(name).ok_or_else(|| {
                PathwinderError::UnknownReferenceName {
                    domain: DOMAIN_KNOWN_FOLDER.to_string(),
                    name: name.to_string(),
                }
            }),
            _ => match self.custom_domains.get(&AsciiCaseKey::new(domain)) {
                Some(resolver_fn) => resolver_fn(name),
                None => Err(PathwinderError::UnknownReferenceDomain {
                    domain: domain.to_string(),
                }),
            },
        }
    }

    fn resolve_builtin(&self, name: &str) -> Result<String> {
        let executable_part = |select: fn(&Path) -> Option<String>| {
            let path = self.environment.executable_path();
            path.as_deref()
                .and_then(|p| select(Path::new(p)))
                .ok_or_else(|| PathwinderError::ReferenceUnavailable {
                    domain: DOMAIN_BUILTIN.to_string(),
                    name: name.to_string(),
                })
        };

        match name.to_ascii_lowercase().as_str() {
            "executablecompletefilename" => executable_part(|path| {
                Some(path.to_string_lossy().into_owned())
            }),
            "executablebasename" => executable_part(|path| {
                path.file_name().map(|part| part.to_string_lossy().into_owned())
            }),
            "executabledirectoryname" => executable_part(|path| {
                path.parent().map(|part| part.to_string_lossy().into_owned())
            }),
            "hostname" => self.environment.hostname().ok_or_else(|| {
                PathwinderError::ReferenceUnavailable {
                    domain: DOMAIN_BUILTIN.to_string(),
                    name: name.to_string(),
                }
            }),
            _ => Err(PathwinderError::UnknownReferenceName {
                domain: DOMAIN_BUILTIN.to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn resolve_configured_definition(&mut self, name: &str) -> Result<String> {
        let Some(definition) = self.definitions.get(&AsciiCaseKey::new(name)) else {
            return Err(PathwinderError::UnknownReferenceName {
                domain: DOMAIN_CONFIGURED_DEFINITION.to_string(),
                name: name.to_string(),
            });
        };
        // Definitions may themselves contain references, resolved recursively
        // under the same in-progress set so cycles are caught.
        let definition = definition.clone();
        self.resolve_all_references(&definition)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
