/// Returns the last path segment of a demangled symbol or type name.
///
/// Generic arguments, trait qualifications and slice or tuple brackets are
/// skipped over, so `<exc_string::Foo as core::fmt::Display>::fmt` yields
/// `fmt`, `alloc::vec::Vec<u8>` yields `Vec` and `app::run::{{closure}}`
/// yields `{{closure}}`. Names without any segment at the top nesting level,
/// like `[u8]` or `()`, are returned unchanged.
pub(crate) fn last_path_segment(s: &str) -> &str {
    let mut word_start = 0usize;
    let mut word_end = 0usize;
    let mut bracket_nesting_level = 0u64;
    let mut curly_nesting_level = 0u64;
    let mut potential_function_arrow = false;
    let mut inside_word = false;

    for (i, c) in s.char_indices() {
        if curly_nesting_level == 0 && bracket_nesting_level == 0 {
            if !inside_word && (c == '_' || unicode_ident::is_xid_start(c)) {
                word_start = i;
                inside_word = true;
            } else if inside_word && !unicode_ident::is_xid_continue(c) {
                word_end = i;
                inside_word = false;
            }
        }

        let was_potential_function_arrow = potential_function_arrow;
        potential_function_arrow = c == '-';

        match c {
            '<' | '[' | '(' => {
                bracket_nesting_level = bracket_nesting_level.saturating_add(1);
            }
            '>' if !was_potential_function_arrow => {
                bracket_nesting_level = bracket_nesting_level.saturating_sub(1);
            }
            ']' | ')' => {
                bracket_nesting_level = bracket_nesting_level.saturating_sub(1);
            }
            '{' => {
                curly_nesting_level = curly_nesting_level.saturating_add(1);
                if !inside_word && curly_nesting_level == 1 && bracket_nesting_level == 0 {
                    word_start = i;
                    inside_word = true;
                }
            }
            '}' => {
                curly_nesting_level = curly_nesting_level.saturating_sub(1);
                if inside_word && curly_nesting_level == 0 {
                    word_end = i + 1;
                    inside_word = false;
                }
            }
            _ => {}
        }
    }

    if word_start < word_end {
        &s[word_start..word_end]
    } else {
        // The last word runs to the end of the string
        &s[word_start..]
    }
}
