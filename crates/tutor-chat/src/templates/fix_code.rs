use super::{ModeTemplate, QuestionTemplate, SeedExchange};
use crate::tags::STOP_FIXED_CODE;
use tutor_core::types::QuestionType;

pub(super) static TEMPLATE: QuestionTemplate = QuestionTemplate {
    question_type: QuestionType::HelpFixCode,
    fresh: ModeTemplate {
        instruction: "Fix the provided C/C++ [code]: so that it matches its [intended-behavior]:, \
keeping the structure of the original code. Look for segmentation faults, logical errors, memory \
leaks, and other common mistakes. Start with an [answer]: that lists each problem with the line \
number where it occurs, then give the corrected code between [fixed-code]: and [end-fixed-code] \
with the changed lines marked, then explain each change by line number. Each response must end \
with [STOP-end-fixed-code-STOP].",
        seeds: FRESH_SEEDS,
        stop: STOP_FIXED_CODE,
        temperature: 0.05,
    },
    continuation: ModeTemplate {
        instruction: "Fix the provided C/C++ [follow-up-code]: so that it matches its \
[intended-behavior]:, taking earlier fixes and explanations into account and keeping the \
structure of the code. Start with an [answer]: that lists each remaining problem with its line \
number, then give the corrected code between [fixed-code]: and [end-fixed-code] with the changed \
lines marked, then explain each change by line number. Each response must end with \
[STOP-end-fixed-code-STOP].",
        seeds: CONTINUATION_SEEDS,
        stop: STOP_FIXED_CODE,
        temperature: 0.15,
    },
    max_tokens: 2048,
};

const BROKEN_FIB: &str = r#"[code]:
void fib(int **arr, int count) {
    *arr = malloc(count * sizeof(int));

    if (count == 0) {
        *arr[0] = 0;
    } else if (count == 1) {
        *arr[0] = 0;
        *arr[1] = 1;
    }

    for (int i = 2; i < count; i++) {
        *arr[i] = *arr[i - 1] + *arr[i - 2];
    }

    return arr;
}
[intended-behavior]: take in an int n, and generate the first n elements of the Fibonacci sequence."#;

const FIXED_FIB: &str = r#"[answer]: The code has several problems:

Line 4-5: `if (count == 0)` followed by `*arr[0] = 0` writes into an array with no elements, which is undefined behavior and usually a segmentation fault.

Line 5, 7, 8, 12: `*arr[i]` parses as `*(arr[i])`, treating `arr` as an array of pointers. Because `arr` is a pointer to the array pointer, the element is `(*arr)[i]`.

Line 6-8: when `count` is 1 the branch writes two elements into space for one, overflowing the buffer.

Line 15: the function is declared `void` but returns `arr`.

[fixed-code]:
void fib(int **arr, int count) {
    *arr = malloc(count * sizeof(int));

    if (count > 0) {                    // FIXED: was "count == 0"
        (*arr)[0] = 0;                  // FIXED: was "*arr[0]"
    }

    if (count > 1) {                    // FIXED: was "else if (count == 1)"
        (*arr)[1] = 1;                  // FIXED: was "*arr[1]"
    }

    for (int i = 2; i < count; i++) {
        (*arr)[i] = (*arr)[i - 1] + (*arr)[i - 2]; // FIXED: was "*arr[i]"
    }
}                                       // FIXED: removed "return arr;"
[end-fixed-code]

Line 4: the first element is only written when at least one element was allocated.

Line 5, 9, 13: `(*arr)[i]` dereferences the double pointer before indexing.

Line 8: the second element is written only when there is room for it, so `count == 1` no longer overflows.

Line 15: the stray return is gone, matching the `void` signature.
[STOP-end-fixed-code-STOP]"#;

static FRESH_SEEDS: &[SeedExchange] = &[SeedExchange {
    user: BROKEN_FIB,
    assistant: FIXED_FIB,
}];

static CONTINUATION_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: BROKEN_FIB,
        assistant: FIXED_FIB,
    },
    SeedExchange {
        user: r#"[follow-up-code]:
void fib(int **arr, int count) {
    *arr = malloc(count * sizeof(int));

    if (count > 0) {
        (*arr)[0] = 0;
    }

    if (count > 1) {
        (*arr)[1] = 1;
    }

    for (int i = 2; i < count; i++) {
        (*arr)[i] = (*arr)[i - 1] + (*arr)[i - 2];
    }
}
[intended-behavior]: add proper error handling for memory allocation failure and handle edge cases better."#,
        assistant: r#"[answer]: Two issues remain:

Line 2: `malloc` can return `NULL`, and the code writes through the result without checking it.

Line 2: a zero or negative `count` still reaches `malloc`, whose behavior for a size of 0 is implementation-defined.

[fixed-code]:
void fib(int **arr, int count) {
    if (count <= 0) {                   // FIXED: reject empty and negative sizes
        *arr = NULL;
        return;
    }

    *arr = malloc(count * sizeof(int));
    if (*arr == NULL) {                 // FIXED: stop if allocation failed
        return;
    }

    (*arr)[0] = 0;

    if (count > 1) {
        (*arr)[1] = 1;
    }

    for (int i = 2; i < count; i++) {
        (*arr)[i] = (*arr)[i - 1] + (*arr)[i - 2];
    }
}
[end-fixed-code]

Line 2-5: sizes of zero or less now leave `*arr` as `NULL` and return before allocating.

Line 8-10: a failed allocation returns early instead of dereferencing `NULL`; callers should check `*arr` after the call.

Line 12: since `count` is now known to be positive, the first element can be written unconditionally.
[STOP-end-fixed-code-STOP]"#,
    },
];
