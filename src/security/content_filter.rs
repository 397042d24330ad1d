//! Content sanitization applied to message text before it is stored
//!
//! The engine only needs `sanitize`; which words get masked is the
//! deployment's business.

/// Rewrites user-supplied text before validation
pub trait ContentFilter: Send + Sync {
    fn sanitize(&self, text: &str) -> String;
}

/// Leaves text untouched
#[derive(Debug, Default, Clone)]
pub struct PassthroughFilter;

impl ContentFilter for PassthroughFilter {
    fn sanitize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Masks blocked words with asterisks, matching whole words case-insensitively
#[derive(Debug, Default, Clone)]
pub struct WordListFilter {
    blocked: Vec<String>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocked: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    fn is_blocked(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.blocked.iter().any(|b| *b == lower)
    }

    fn flush_word(&self, word: &mut String, out: &mut String) {
        if word.is_empty() {
            return;
        }
        if self.is_blocked(word) {
            out.extend(std::iter::repeat('*').take(word.chars().count()));
        } else {
            out.push_str(word);
        }
        word.clear();
    }
}

impl ContentFilter for WordListFilter {
    fn sanitize(&self, text: &str) -> String {
        if self.blocked.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        for c in text.chars() {
            if c.is_alphanumeric() || c == '\'' {
                word.push(c);
            } else {
                self.flush_word(&mut word, &mut out);
                out.push(c);
            }
        }
        self.flush_word(&mut word, &mut out);
        out
    }
}
