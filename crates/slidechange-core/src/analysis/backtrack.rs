/// Walk back from `peak` to the first frame of the change run that produced it.
///
/// The run is the stretch of consecutive frames with `subset_avg_change > 0`
/// ending at the peak. The result never exceeds `peak`; if the peak frame
/// itself shows no change, the peak is its own start.
pub fn backtrack_start(subset: &[f64], peak: usize) -> usize {
    let Some(last) = subset.len().checked_sub(1) else {
        return 0;
    };
    let peak = peak.min(last);

    subset[..=peak]
        .iter()
        .rposition(|&v| v <= 0.0 || v.is_nan())
        .map_or(0, |quiet| quiet + 1)
        .min(peak)
}
