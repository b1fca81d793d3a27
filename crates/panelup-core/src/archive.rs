#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    TarGz,
    TarZst,
    Tar,
}

impl ArchiveType {
    /// Arguments handed to `tar` when the archive arrives on stdin.
    pub fn tar_extract_args(self) -> &'static [&'static str] {
        match self {
            Self::TarGz => &["-xzv"],
            Self::TarZst => &["--zstd", "-xv"],
            Self::Tar => &["-xv"],
        }
    }

    pub fn infer_from_url(url: &str) -> Option<Self> {
        let lower = url.to_ascii_lowercase();
        let without_fragment = lower.split('#').next().unwrap_or(&lower);
        let without_query = without_fragment
            .split('?')
            .next()
            .unwrap_or(without_fragment);

        if without_query.ends_with(".tar.gz") || without_query.ends_with(".tgz") {
            return Some(Self::TarGz);
        }
        if without_query.ends_with(".tar.zst") || without_query.ends_with(".tzst") {
            return Some(Self::TarZst);
        }
        if without_query.ends_with(".tar") {
            return Some(Self::Tar);
        }

        None
    }

    /// Release assets without a recognizable suffix are gzip tarballs.
    pub fn for_url(url: &str) -> Self {
        Self::infer_from_url(url).unwrap_or(Self::TarGz)
    }
}
