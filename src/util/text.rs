pub fn normalize_token(value: &str) -> String {
  fold_accents(&value.to_lowercase())
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<&str>>()
    .join(" ")
}

/// Case, accent and punctuation insensitive substring check.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
  let needle = normalize_token(phrase);
  if needle.is_empty() {
    return false;
  }
  normalize_token(text).contains(&needle)
}

pub fn contains_any_phrase(text: &str, phrases: &[&str]) -> bool {
  phrases.iter().any(|p| contains_phrase(text, p))
}

/// Trimmed value, or `None` when blank.
pub fn non_blank(value: Option<&str>) -> Option<String> {
  value
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

fn fold_accents(value: &str) -> String {
  value
    .chars()
    .map(|c| match c {
      'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
      'é' | 'è' | 'ê' | 'ë' => 'e',
      'í' | 'ì' | 'î' | 'ï' => 'i',
      'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
      'ú' | 'ù' | 'û' | 'ü' => 'u',
      'ç' => 'c',
      'ñ' => 'n',
      other => other,
    })
    .collect()
}
