//! Hint resolution shared by tree lookups and bundle component discovery

/// Outcome of matching a hint against named, kinded entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection<'a> {
    /// Exactly one entry
    One(&'a str),
    /// No entry name contains the hint
    Missing,
    /// Several entries remain after narrowing; their names
    Ambiguous(Vec<&'a str>),
}

/// Match `hint` against `(name, kind)` pairs.
///
/// An entry matches when its name contains the hint. With several matches,
/// only those whose kind equals the hint exactly are kept; if that leaves one,
/// it wins. Otherwise the remaining candidates are reported: the exact-kind
/// matches if there were several, else every substring match.
pub(crate) fn resolve<'a, I>(entries: I, hint: &str) -> Selection<'a>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let matches: Vec<(&'a str, &'a str)> = entries
        .into_iter()
        .filter(|(name, _)| name.contains(hint))
        .collect();

    match matches.len() {
        0 => Selection::Missing,
        1 => Selection::One(matches[0].0),
        _ => {
            let exact: Vec<&'a str> = matches
                .iter()
                .filter(|(_, kind)| *kind == hint)
                .map(|(name, _)| *name)
                .collect();
            match exact.len() {
                1 => Selection::One(exact[0]),
                0 => Selection::Ambiguous(matches.iter().map(|(name, _)| *name).collect()),
                _ => Selection::Ambiguous(exact),
            }
        }
    }
}
