use rand::Rng;

/// Returns a shuffled copy of `input`; the input slice is never mutated.
///
/// Unbiased Fisher-Yates: walk `i` from the last index down to 1 and swap
/// with a uniform `j` in `[0, i]`. The randomness only decides question
/// and option order, so the thread RNG is sufficient; nothing here is a
/// security boundary.
pub fn shuffled<T: Clone>(input: &[T]) -> Vec<T> {
    let mut out = input.to_vec();
    let mut rng = rand::rng();

    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_a_permutation_of_input() {
        for n in 0..32usize {
            let input: Vec<usize> = (0..n).collect();
            let mut output = shuffled(&input);

            assert_eq!(output.len(), input.len());
            output.sort_unstable();
            assert_eq!(output, input);
        }
    }

    #[test]
    fn input_is_not_mutated() {
        let input = vec!["a", "b", "c", "d", "e"];
        let before = input.clone();
        let _ = shuffled(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn preserves_duplicate_multiplicities() {
        let input = vec![1, 1, 2, 2, 2, 3];
        let mut output = shuffled(&input);
        output.sort_unstable();
        assert_eq!(output, vec![1, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn handles_empty_and_single_element() {
        assert!(shuffled::<u8>(&[]).is_empty());
        assert_eq!(shuffled(&[42]), vec![42]);
    }
}
