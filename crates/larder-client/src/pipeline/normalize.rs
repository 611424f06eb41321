use std::collections::HashSet;

use crate::config::AliasSetting;

/// Known point-of-sale labels that differ from their recipe-table names.
const BUILT_IN_ALIASES: [(&str, &str); 2] = [
    ("mai's bf chicken cutlet", "chicken cutlet"),
    ("mai og fried chicken wings", "fried wings"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Exact,
    Alias,
    Fuzzy,
    Unmatched,
}

impl ResolutionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Alias => "alias",
            Self::Fuzzy => "fuzzy",
            Self::Unmatched => "unmatched",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameResolution {
    pub input: String,
    pub resolved: String,
    pub kind: ResolutionKind,
    pub score: Option<f64>,
}

impl NameResolution {
    pub fn is_matched(&self) -> bool {
        self.kind != ResolutionKind::Unmatched
    }
}

/// One alias rule. Rules are checked top to bottom; the first hit wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRule {
    pub from: String,
    pub to: String,
}

pub fn default_alias_rules() -> Vec<AliasRule> {
    BUILT_IN_ALIASES
        .iter()
        .map(|(from, to)| AliasRule {
            from: (*from).to_string(),
            to: (*to).to_string(),
        })
        .collect()
}

/// Built-in aliases followed by configured ones, all in canonical form.
pub fn alias_rules_with(extra: &[AliasSetting]) -> Vec<AliasRule> {
    let mut rules = default_alias_rules();
    rules.extend(extra.iter().map(|setting| AliasRule {
        from: canonical_name(&setting.from),
        to: canonical_name(&setting.to),
    }));
    rules
}

/// Lowercases, drops `(<digits>)` pack tags and collapses whitespace.
pub fn canonical_name(raw: &str) -> String {
    let mut stripped = raw.to_lowercase();
    // Removing one tag can expose another, e.g. `((1)2)`.
    loop {
        let next = strip_quantity_tags(&stripped);
        if next == stripped {
            break;
        }
        stripped = next;
    }
    stripped.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn strip_quantity_tags(value: &str) -> String {
    let chars = value.chars().collect::<Vec<char>>();
    let mut output = String::with_capacity(value.len());
    let mut index = 0;

    while index < chars.len() {
        if chars[index] == '(' {
            let digits = chars[index + 1..]
                .iter()
                .take_while(|character| character.is_ascii_digit())
                .count();
            let close = index + 1 + digits;
            if digits > 0 && chars.get(close) == Some(&')') {
                index = close + 1;
                continue;
            }
        }
        output.push(chars[index]);
        index += 1;
    }

    output
}

/// Resolves sales-side item names to recipe-table names.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    candidates: Vec<String>,
    known: HashSet<String>,
    aliases: Vec<AliasRule>,
    threshold: f64,
}

impl NameNormalizer {
    pub fn new(candidates: Vec<String>, aliases: Vec<AliasRule>, threshold: f64) -> Self {
        let known = candidates.iter().cloned().collect::<HashSet<String>>();
        Self {
            candidates,
            known,
            aliases,
            threshold,
        }
    }

    pub fn resolve(&self, raw: &str) -> NameResolution {
        let input = canonical_name(raw);
        if self.known.contains(&input) {
            return NameResolution {
                resolved: input.clone(),
                input,
                kind: ResolutionKind::Exact,
                score: None,
            };
        }

        let aliased = self
            .aliases
            .iter()
            .find(|rule| rule.from == input)
            .map(|rule| rule.to.clone());
        if let Some(target) = &aliased
            && self.known.contains(target)
        {
            return NameResolution {
                input,
                resolved: target.clone(),
                kind: ResolutionKind::Alias,
                score: None,
            };
        }

        let lookup = aliased.unwrap_or_else(|| input.clone());
        match self.best_candidate(&lookup) {
            Some((candidate, score)) if accepts(score, self.threshold) => NameResolution {
                input,
                resolved: candidate.to_string(),
                kind: ResolutionKind::Fuzzy,
                score: Some(score),
            },
            best => NameResolution {
                input,
                resolved: lookup,
                kind: ResolutionKind::Unmatched,
                score: best.map(|(_, score)| score),
            },
        }
    }

    /// Highest-scoring candidate; ties keep the earliest candidate.
    fn best_candidate(&self, value: &str) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for candidate in &self.candidates {
            let score = similarity_score(value, candidate);
            let better = match best {
                Some((_, current)) => score > current,
                None => true,
            };
            if better {
                best = Some((candidate.as_str(), score));
            }
        }
        best
    }
}

pub fn accepts(score: f64, threshold: f64) -> bool {
    score >= threshold
}

/// Edit-distance similarity on a 0-100 scale.
pub fn similarity_score(left: &str, right: &str) -> f64 {
    let longest = left.chars().count().max(right.chars().count());
    if longest == 0 {
        return 100.0;
    }
    let distance = levenshtein_distance(left, right);
    100.0 * (longest - distance) as f64 / longest as f64
}

fn levenshtein_distance(left: &str, right: &str) -> usize {
    if left == right {
        return 0;
    }

    let right_chars = right.chars().collect::<Vec<char>>();
    if left.is_empty() {
        return right_chars.len();
    }

    let mut previous = (0..=right_chars.len()).collect::<Vec<usize>>();
    let mut current = vec![0; right_chars.len() + 1];

    for (left_index, left_char) in left.chars().enumerate() {
        current[0] = left_index + 1;
        for (right_index, right_char) in right_chars.iter().enumerate() {
            let substitution = previous[right_index] + usize::from(left_char != *right_char);
            current[right_index + 1] = substitution
                .min(previous[right_index + 1] + 1)
                .min(current[right_index] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right_chars.len()]
}
