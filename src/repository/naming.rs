//! Mapping from module paths to storage coordinates.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::protocol::AssetKind;

/// Namespace used when a route does not configure one.
pub const DEFAULT_NAMESPACE: &str = "modgate";

/// Turn a module path into a legal generic package name.
///
/// Package names must match `([a-zA-Z0-9])+([-_+.]?[a-zA-Z0-9])*`, while module
/// paths may also contain `/` and `~`. Those are "plus"-encoded; `+` itself
/// is encoded first so the substitution does not feed on its own output.
///
/// Not collision-free: a module path containing a literal `+2F` is
/// indistinguishable from one containing `/`.
pub fn package_name(module: &str) -> String {
    module
        .replace('+', "+2B")
        .replace('/', "+2F")
        .replace('~', "+7E")
}

/// The namespace to use for a route.
pub fn namespace_or_default(namespace: Option<&str>) -> &str {
    namespace.unwrap_or(DEFAULT_NAMESPACE)
}

/// Lowercase hex SHA-256 of an asset.
pub fn asset_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Where a repository lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    pub domain: String,
    pub domain_owner: Option<String>,
    pub repository: String,
    pub namespace: String,
}

impl RepositoryLocation {
    /// Address a package inside this repository.
    pub fn package(&self, module: &str) -> PackageKey {
        PackageKey {
            location: self.clone(),
            package: package_name(module),
        }
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Domain:{}({}) Repo:{} NS:{}",
            self.domain,
            self.domain_owner.as_deref().unwrap_or(""),
            self.repository,
            self.namespace
        )
    }
}

/// Fully-qualified package coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageKey {
    pub location: RepositoryLocation,
    /// Escaped package name.
    pub package: String,
}

impl PackageKey {
    /// Address one asset of one version.
    pub fn asset(&self, version: &str, kind: AssetKind) -> AssetKey {
        AssetKey {
            package: self.clone(),
            version: version.to_string(),
            kind,
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Pkg:{}", self.location, self.package)
    }
}

/// Fully-qualified asset coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetKey {
    pub package: PackageKey,
    pub version: String,
    pub kind: AssetKind,
}

impl AssetKey {
    /// Asset name in storage, e.g. `v1.0.0.zip`.
    pub fn asset_name(&self) -> String {
        self.kind.file_name(&self.version)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Version:{} Asset:{}",
            self.package,
            self.version,
            self.asset_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_package_name_escapes() {
        assert_eq!(package_name("a/b+c~d"), "a+2Fb+2Bc+7Ed");
        assert_eq!(
            package_name("golang.org/x/crypto"),
            "golang.org+2Fx+2Fcrypto"
        );
        assert_eq!(package_name("plain"), "plain");
    }

    #[test]
    fn test_package_name_injective_over_corpus() {
        let corpus = [
            "github.com/acme/widgets",
            "github.com/acme/widgets/v2",
            "github.com/acme+widgets",
            "github.com/acme~widgets",
            "github.com/acme/+widgets",
            "github.com/acme/~widgets",
            "example.com/a/b",
            "example.com/a+b",
            "example.com/a~b",
            "example.com/a.b",
            "example.com/a-b",
            "example.com/a_b",
        ];
        let escaped: HashSet<_> = corpus.iter().map(|m| package_name(m)).collect();
        assert_eq!(escaped.len(), corpus.len());
    }

    #[test]
    fn test_package_name_is_deterministic() {
        assert_eq!(package_name("x/y~z+w"), package_name("x/y~z+w"));
    }

    #[test]
    fn test_namespace_default() {
        assert_eq!(namespace_or_default(None), DEFAULT_NAMESPACE);
        assert_eq!(namespace_or_default(Some("team")), "team");
    }

    #[test]
    fn test_asset_sha256() {
        assert_eq!(
            asset_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_asset_key_display_carries_coordinates() {
        let location = RepositoryLocation {
            domain: "acme".into(),
            domain_owner: Some("111111111111".into()),
            repository: "go".into(),
            namespace: "team".into(),
        };
        let key = location
            .package("github.com/acme/widgets")
            .asset("v0.1.0", AssetKind::Zip);
        assert_eq!(
            key.to_string(),
            "Domain:acme(111111111111) Repo:go NS:team Pkg:github.com+2Facme+2Fwidgets Version:v0.1.0 Asset:v0.1.0.zip"
        );
    }
}
