//! Ranking: best verdicts first, truncated to N.

use crate::output::Verdict;

/// Sort verdicts by score, highest first, and keep the first `n`.
///
/// The sort is stable, so equal scores keep their collection order. A
/// verdict without a score ranks as 0. `n` larger than the input returns
/// everything.
pub fn rank_verdicts(mut verdicts: Vec<Verdict>, n: usize) -> Vec<Verdict> {
    verdicts.sort_by(|a, b| b.rank_score().cmp(&a.rank_score()));
    verdicts.truncate(n);
    verdicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SourceRef;

    fn v(index: usize, score: Option<i64>) -> Verdict {
        Verdict {
            name: Some(format!("c{index}")),
            score,
            summary: None,
            missing_skills: vec![],
            experience_years: None,
            source: SourceRef {
                index,
                name: format!("c{index}.pdf"),
                mime: "application/pdf".into(),
            },
        }
    }

    fn indices(vs: &[Verdict]) -> Vec<usize> {
        vs.iter().map(|v| v.source.index).collect()
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let out = rank_verdicts(vec![v(0, Some(60)), v(1, Some(90)), v(2, Some(75))], 2);
        assert_eq!(indices(&out), vec![1, 2]);
    }

    #[test]
    fn ties_keep_collection_order() {
        let out = rank_verdicts(
            vec![v(0, Some(70)), v(1, Some(80)), v(2, Some(70)), v(3, Some(80))],
            4,
        );
        assert_eq!(indices(&out), vec![1, 3, 0, 2]);
    }

    #[test]
    fn missing_score_sorts_as_zero() {
        let out = rank_verdicts(vec![v(0, None), v(1, Some(-3)), v(2, Some(1)), v(3, Some(0))], 10);
        assert_eq!(indices(&out), vec![2, 0, 3, 1]);
    }

    #[test]
    fn length_is_min_of_n_and_input() {
        for n in 1..6 {
            let input: Vec<_> = (0..3).map(|i| v(i, Some(i as i64 * 10))).collect();
            let out = rank_verdicts(input, n);
            assert_eq!(out.len(), n.min(3));
            assert!(out.windows(2).all(|w| w[0].rank_score() >= w[1].rank_score()));
        }
    }

    #[test]
    fn empty_input() {
        assert!(rank_verdicts(vec![], 3).is_empty());
    }
}
