/// Display label for an internal field name.
///
/// Underscores become spaces and every word is capitalized: a letter is uppercased when the
/// character before it is not a letter, lowercased otherwise. Nothing is trimmed, so
/// `"cuisines_"` becomes `"Cuisines "`.
pub fn display_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut previous_is_letter = false;
    for c in name.chars().map(|c| if c == '_' { ' ' } else { c }) {
        if c.is_alphabetic() {
            if previous_is_letter {
                label.extend(c.to_lowercase());
            } else {
                label.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            label.push(c);
            previous_is_letter = false;
        }
    }
    label
}
