//! SDP text helpers.

const MEDIA_SEPARATOR: &str = "\nm=";

/// Moves the audio media section in front of every other media section.
///
/// Both peers then see the same m-line order regardless of the order the
/// transceivers were created in. The session-level header and the relative
/// order of the remaining sections are preserved; SDP without an audio
/// section is returned unchanged.
pub fn normalize_audio_first(sdp: &str) -> String {
    // Keep the final line break outside the sections so the moved section
    // ends the same way as its neighbours.
    let (body, tail) = sdp.strip_suffix('\n').map_or((sdp, ""), |b| (b, "\n"));
    let mut sections: Vec<&str> = body.split(MEDIA_SEPARATOR).collect();

    // sections[0] is the session header, media sections follow.
    let audio_index = sections
        .iter()
        .skip(1)
        .position(|section| section.starts_with("audio"))
        .map(|i| i + 1);

    match audio_index {
        Some(index) if index > 1 => {
            let audio = sections.remove(index);
            sections.insert(1, audio);
            let mut out = sections.join(MEDIA_SEPARATOR);
            out.push_str(tail);
            out
        }
        _ => sdp.to_owned(),
    }
}

/// Media kinds of the m-lines in order, e.g. `["audio", "video"]`.
pub fn media_kinds(sdp: &str) -> Vec<&str> {
    sdp.split(MEDIA_SEPARATOR)
        .skip(1)
        .filter_map(|section| section.split_whitespace().next())
        .collect()
}

/// Value of the first `a=ice-ufrag` line.
pub fn ice_ufrag(sdp: &str) -> Option<&str> {
    sdp.lines()
        .find_map(|line| line.strip_prefix("a=ice-ufrag:"))
        .map(str::trim)
}
