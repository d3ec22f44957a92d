//! Package tools: zipalign, apksigner and jarsigner behind one interface

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::credentials::SigningCredentials;
use crate::error::{Result, SigningError};
use crate::package::PackageKind;
use crate::runner::{ToolInvocation, ToolOutput, ToolRunner};
use crate::toolchain::{find_jarsigner, SdkLocation};

/// Signature algorithm passed to jarsigner
pub const JAR_SIGNATURE_ALGORITHM: &str = "SHA256withRSA";

/// Digest algorithm passed to jarsigner
pub const JAR_DIGEST_ALGORITHM: &str = "SHA-256";

/// Alignment boundary in bytes
const ALIGNMENT: &str = "4";

/// How the aligned APK is produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignMode {
    /// Write a genuinely aligned copy with `zipalign -f -v 4`
    #[default]
    Realign,
    /// Copy the input verbatim after the alignment check. The result is
    /// only aligned if the input already was.
    Copy,
}

impl fmt::Display for AlignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Realign => write!(f, "realign"),
            Self::Copy => write!(f, "copy"),
        }
    }
}

impl FromStr for AlignMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "realign" => Ok(Self::Realign),
            "copy" => Ok(Self::Copy),
            _ => Err(format!("unknown align mode '{s}' (expected realign or copy)")),
        }
    }
}

/// What to sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignTarget<'a> {
    /// Sign `input` into a new file at `output`
    Apk { input: &'a Path, output: &'a Path },
    /// Sign the bundle in place
    Aab { bundle: &'a Path },
}

impl SignTarget<'_> {
    fn package(&self) -> &Path {
        match self {
            Self::Apk { input, .. } => input,
            Self::Aab { bundle } => bundle,
        }
    }
}

/// External capabilities the orchestrator needs
#[async_trait::async_trait]
pub trait PackageTools: Send + Sync {
    /// Make sure the tools for `kind` can be found, before anything runs
    async fn resolve(&self, kind: PackageKind) -> Result<()>;

    /// Produce an aligned copy of `apk` at `aligned`
    async fn align(&self, apk: &Path, aligned: &Path) -> Result<()>;

    /// Sign a package
    async fn sign(&self, target: SignTarget<'_>, credentials: &SigningCredentials) -> Result<()>;

    /// Verify the signature of a signed package
    async fn verify(&self, kind: PackageKind, path: &Path) -> Result<()>;
}

/// The real Android toolchain
pub struct AndroidTools<R> {
    runner: R,
    sdk: SdkLocation,
    jarsigner: Option<PathBuf>,
    align_mode: AlignMode,
}

impl<R: ToolRunner> AndroidTools<R> {
    pub fn new(runner: R, sdk: SdkLocation) -> Self {
        Self {
            runner,
            sdk,
            jarsigner: None,
            align_mode: AlignMode::default(),
        }
    }

    pub fn with_align_mode(mut self, align_mode: AlignMode) -> Self {
        self.align_mode = align_mode;
        self
    }

    /// Use a fixed jarsigner instead of searching PATH
    pub fn with_jarsigner(mut self, jarsigner: Option<PathBuf>) -> Self {
        self.jarsigner = jarsigner;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn sdk(&self) -> &SdkLocation {
        &self.sdk
    }

    pub fn align_mode(&self) -> AlignMode {
        self.align_mode
    }

    fn jarsigner(&self) -> Result<PathBuf> {
        match &self.jarsigner {
            Some(path) => Ok(path.clone()),
            None => find_jarsigner(),
        }
    }

    async fn execute(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        debug!(command = %invocation, "executing");
        self.runner.run(&invocation).await
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// `apksigner sign --ks <ks> --ks-key-alias <alias> --ks-pass pass:<pw>
/// [--key-pass pass:<pw>] --out <out> <in>`
pub fn apksigner_sign(
    apksigner: &Path,
    input: &Path,
    output: &Path,
    credentials: &SigningCredentials,
) -> ToolInvocation {
    let mut invocation = ToolInvocation::new(apksigner).args([
        "sign".to_string(),
        "--ks".to_string(),
        path_arg(credentials.keystore()),
        "--ks-key-alias".to_string(),
        credentials.alias().to_string(),
        "--ks-pass".to_string(),
        format!("pass:{}", credentials.keystore_password()),
    ]);

    if let Some(key_password) = credentials.key_password() {
        invocation = invocation.args(["--key-pass".to_string(), format!("pass:{key_password}")]);
    }

    invocation
        .args(["--out".to_string(), path_arg(output)])
        .arg(path_arg(input))
}

/// `jarsigner -verbose -sigalg SHA256withRSA -digestalg SHA-256 -keystore
/// <ks> -storepass <pw> [-keypass <pw>] <aab> <alias>`
pub fn jarsigner_sign(
    jarsigner: &Path,
    bundle: &Path,
    credentials: &SigningCredentials,
) -> ToolInvocation {
    let mut invocation = ToolInvocation::new(jarsigner).args([
        "-verbose".to_string(),
        "-sigalg".to_string(),
        JAR_SIGNATURE_ALGORITHM.to_string(),
        "-digestalg".to_string(),
        JAR_DIGEST_ALGORITHM.to_string(),
        "-keystore".to_string(),
        path_arg(credentials.keystore()),
        "-storepass".to_string(),
        credentials.keystore_password().to_string(),
    ]);

    if let Some(key_password) = credentials.key_password() {
        invocation = invocation.args(["-keypass".to_string(), key_password.to_string()]);
    }

    invocation
        .arg(path_arg(bundle))
        .arg(credentials.alias())
}

#[async_trait::async_trait]
impl<R: ToolRunner> PackageTools for AndroidTools<R> {
    async fn resolve(&self, kind: PackageKind) -> Result<()> {
        match kind {
            PackageKind::Apk => {
                let dir = self.sdk.build_tools_dir()?;
                if !dir.is_dir() {
                    error!(path = %dir.display(), "couldn't find the Android build tools");
                }
                Ok(())
            }
            PackageKind::Aab => self.jarsigner().map(|_| ()),
        }
    }

    async fn align(&self, apk: &Path, aligned: &Path) -> Result<()> {
        let zipalign = self.sdk.zipalign()?;

        let check = self
            .execute(
                ToolInvocation::new(&zipalign)
                    .args(["-c", "-v", ALIGNMENT])
                    .arg(path_arg(apk)),
            )
            .await?;
        if check.success() {
            debug!(path = %apk.display(), "input is already aligned");
        } else {
            warn!(
                path = %apk.display(),
                reason = %check.failure_reason(),
                "alignment check did not pass, continuing"
            );
        }

        match self.align_mode {
            AlignMode::Copy => {
                tokio::fs::copy(apk, aligned).await?;
                debug!(path = %aligned.display(), "copied input as aligned package");
            }
            AlignMode::Realign => {
                let output = self
                    .execute(
                        ToolInvocation::new(&zipalign)
                            .args(["-f", "-v", ALIGNMENT])
                            .arg(path_arg(apk))
                            .arg(path_arg(aligned)),
                    )
                    .await?;
                if !output.success() {
                    return Err(SigningError::AlignmentFailed {
                        path: apk.to_path_buf(),
                        reason: output.failure_reason(),
                    });
                }
            }
        }

        Ok(())
    }

    async fn sign(&self, target: SignTarget<'_>, credentials: &SigningCredentials) -> Result<()> {
        let invocation = match target {
            SignTarget::Apk { input, output } => {
                apksigner_sign(&self.sdk.apksigner()?, input, output, credentials)
            }
            SignTarget::Aab { bundle } => jarsigner_sign(&self.jarsigner()?, bundle, credentials),
        };

        let output = self.execute(invocation).await?;
        if !output.success() {
            return Err(SigningError::SigningFailed {
                path: target.package().to_path_buf(),
                reason: output.failure_reason(),
            });
        }
        Ok(())
    }

    async fn verify(&self, kind: PackageKind, path: &Path) -> Result<()> {
        let tool = match kind {
            PackageKind::Apk => self.sdk.apksigner()?,
            PackageKind::Aab => self.jarsigner()?,
        };

        let output = self
            .execute(ToolInvocation::new(tool).arg("verify").arg(path_arg(path)))
            .await?;
        if !output.success() {
            return Err(SigningError::VerificationFailed {
                path: path.to_path_buf(),
                reason: output.failure_reason(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use tempfile::TempDir;

    fn creds() -> SigningCredentials {
        SigningCredentials::new("key.jks", "mykey", "pw1")
    }

    fn tools(root: &Path) -> AndroidTools<RecordingRunner> {
        AndroidTools::new(
            RecordingRunner::new(),
            SdkLocation::new(Some(root.to_path_buf()), "30.0.2"),
        )
        .with_jarsigner(Some(PathBuf::from("/jdk/bin/jarsigner")))
    }

    #[test]
    fn test_apksigner_arguments_without_key_password() {
        let invocation = apksigner_sign(
            Path::new("apksigner"),
            Path::new("app-release-unsigned-aligned.apk"),
            Path::new("app-release-unsigned-signed.apk"),
            &creds(),
        );
        assert_eq!(
            invocation.args,
            vec![
                "sign",
                "--ks",
                "key.jks",
                "--ks-key-alias",
                "mykey",
                "--ks-pass",
                "pass:pw1",
                "--out",
                "app-release-unsigned-signed.apk",
                "app-release-unsigned-aligned.apk",
            ]
        );
    }

    #[test]
    fn test_apksigner_arguments_with_key_password() {
        let invocation = apksigner_sign(
            Path::new("apksigner"),
            Path::new("in.apk"),
            Path::new("out.apk"),
            &creds().with_key_password(Some("pw2")),
        );
        assert_eq!(
            invocation.args[7..],
            ["--key-pass", "pass:pw2", "--out", "out.apk", "in.apk"]
        );
    }

    #[test]
    fn test_jarsigner_arguments() {
        let invocation = jarsigner_sign(
            Path::new("jarsigner"),
            Path::new("app.aab"),
            &creds().with_key_password(Some("pw2")),
        );
        assert_eq!(
            invocation.args,
            vec![
                "-verbose",
                "-sigalg",
                "SHA256withRSA",
                "-digestalg",
                "SHA-256",
                "-keystore",
                "key.jks",
                "-storepass",
                "pw1",
                "-keypass",
                "pw2",
                "app.aab",
                "mykey",
            ]
        );
    }

    #[test]
    fn test_align_mode_parsing() {
        assert_eq!("realign".parse::<AlignMode>().unwrap(), AlignMode::Realign);
        assert_eq!("copy".parse::<AlignMode>().unwrap(), AlignMode::Copy);
        for rejected in ["zopfli", "Copy", "zipalign", "legacy"] {
            assert!(rejected.parse::<AlignMode>().is_err(), "{rejected}");
        }
        assert_eq!(AlignMode::default(), AlignMode::Realign);
    }

    #[tokio::test]
    async fn test_realign_runs_check_then_zipalign() {
        let temp = TempDir::new().unwrap();
        let apk = temp.path().join("app.apk");
        let aligned = temp.path().join("app-aligned.apk");
        std::fs::write(&apk, b"apk").unwrap();

        let tools = tools(Path::new("/sdk"));
        tools.align(&apk, &aligned).await.unwrap();

        let calls = tools.runner().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].program,
            PathBuf::from("/sdk/build-tools/30.0.2/zipalign")
        );
        assert_eq!(calls[0].args[..3], ["-c", "-v", "4"]);
        assert_eq!(calls[1].args[..3], ["-f", "-v", "4"]);
        assert_eq!(calls[1].args[4], aligned.to_string_lossy());
        assert!(aligned.exists());
    }

    #[tokio::test]
    async fn test_copy_mode_ignores_failed_check() {
        let temp = TempDir::new().unwrap();
        let apk = temp.path().join("app.apk");
        let aligned = temp.path().join("app-aligned.apk");
        std::fs::write(&apk, b"original bytes").unwrap();

        let tools = tools(Path::new("/sdk")).with_align_mode(AlignMode::Copy);
        tools.runner().fail("zipalign -c", 1);
        tools.align(&apk, &aligned).await.unwrap();

        assert_eq!(tools.runner().calls().len(), 1);
        assert_eq!(std::fs::read(&aligned).unwrap(), b"original bytes");
    }

    #[tokio::test]
    async fn test_failed_realign() {
        let temp = TempDir::new().unwrap();
        let apk = temp.path().join("app.apk");
        std::fs::write(&apk, b"apk").unwrap();

        let tools = tools(Path::new("/sdk"));
        tools.runner().fail("zipalign -f", 1);
        let err = tools
            .align(&apk, &temp.path().join("app-aligned.apk"))
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::AlignmentFailed { .. }));
    }

    #[tokio::test]
    async fn test_sign_failure_maps_to_signing_failed() {
        let tools = tools(Path::new("/sdk"));
        tools.runner().fail("apksigner sign", 2);
        let err = tools
            .sign(
                SignTarget::Apk {
                    input: Path::new("in.apk"),
                    output: Path::new("out.apk"),
                },
                &creds(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::SigningFailed { path, .. } if path == Path::new("in.apk")));
    }

    #[tokio::test]
    async fn test_verify_failure_maps_to_verification_failed() {
        let tools = tools(Path::new("/sdk"));
        tools.runner().fail("jarsigner verify", 1);
        let err = tools
            .verify(PackageKind::Aab, Path::new("app.aab"))
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::VerificationFailed { .. }));

        let calls = tools.runner().calls();
        assert_eq!(calls[0].program, PathBuf::from("/jdk/bin/jarsigner"));
        assert_eq!(calls[0].args, vec!["verify", "app.aab"]);
    }

    #[tokio::test]
    async fn test_missing_sdk_fails_before_spawning() {
        let tools = AndroidTools::new(RecordingRunner::new(), SdkLocation::default());

        let err = tools.resolve(PackageKind::Apk).await.unwrap_err();
        assert!(matches!(err, SigningError::ToolchainMissing { .. }));
        let err = tools
            .align(Path::new("app.apk"), Path::new("app-aligned.apk"))
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::ToolchainMissing { .. }));
        assert!(tools.runner().calls().is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_build_tools_logged_once_per_package() {
        let temp = TempDir::new().unwrap();
        let apk = temp.path().join("app.apk");
        std::fs::write(&apk, b"apk").unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::ERROR)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let orchestrator = crate::orchestrator::Orchestrator::new(tools(temp.path()));
        orchestrator.sign_path(&apk, &creds()).await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("couldn't find the Android build tools").count(), 1);
    }
}
