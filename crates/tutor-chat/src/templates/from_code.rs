use super::{ModeTemplate, QuestionTemplate, SeedExchange};
use crate::tags::END_QUESTION_ANSWER;
use tutor_core::types::QuestionType;

pub(super) static TEMPLATE: QuestionTemplate = QuestionTemplate {
    question_type: QuestionType::QuestionFromCode,
    fresh: ModeTemplate {
        instruction: "For each provided [code] and asked [question] about that code, provide a \
thorough [answer] (single paragraph). If needed, also provide a C/C++ [code]: example with a \
[code-title]: line, ending it with [end-code]. Each response must end with [end-question-answer].",
        seeds: FRESH_SEEDS,
        stop: END_QUESTION_ANSWER,
        temperature: 0.3,
    },
    continuation: ModeTemplate {
        instruction: "For each asked [question] or [follow-up-question], provide a thorough [answer] \
(single paragraph) that refers back to the provided [code] where relevant. If needed, also provide \
a [code]: example with a [code-title]: line, ending it with [end-code]. Each response must end \
with [end-question-answer].",
        seeds: CONTINUATION_SEEDS,
        stop: END_QUESTION_ANSWER,
        temperature: 0.15,
    },
    max_tokens: 1024,
};

static FRESH_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: "[code]:
nice code you got over there :)
[question]: what is the meaning of life?",
        assistant: "[answer]: Sorry, this is an irrelevant question. Please ask questions related to programming.
[end-question-answer]",
    },
    SeedExchange {
        user: r#"[code]:
void fib(int **pt, int n) {
    *pt = malloc(sizeof(int) * n);
    int *heap_pt = *pt;
    for (int i = 0; i < n; i++) {
        if (i == 0) {
            heap_pt[0] = 0;
        } else if (i == 1) {
            heap_pt[1] = 1;
        } else {
            heap_pt[i] = heap_pt[i - 1] + heap_pt[i - 2];
        }
    }
}
[question]: is heap_pt pointing to the first element of an array?"#,
        assistant: "[answer]: Yes. `malloc` reserves room for `n` integers on the heap and returns the address of the first one, which is stored through the double pointer into `*pt`. `heap_pt` is then assigned that same address, so it points at element 0 of the dynamically allocated array, and indexing it as `heap_pt[i]` walks the array while the loop fills in the Fibonacci numbers.
[end-question-answer]",
    },
    SeedExchange {
        user: r#"[code]:
unsigned long fsize(char* file) {
    FILE f = fopen(file, "r");
    fseek(0, f, SEEK_END);
    long len = long(ftell(f));
    fclose(f);

    return len;
}
[question]: what's wrong with this code?"#,
        assistant: r#"[answer]: There are three problems: 1. `fopen` returns a `FILE *`, but `f` is declared as a plain `FILE`. 2. `fseek` takes the file pointer first and the offset second, but the arguments are swapped. 3. `long(ftell(f))` is C++ function-style cast syntax, which is not valid C; `ftell` already returns a `long`.
[code]:
[code-title]: fixed code
unsigned long fsize(char* file) {
    FILE *f = fopen(file, "r");
    fseek(f, 0, SEEK_END);
    long len = ftell(f);
    fclose(f);

    return len;
}
[end-code]
[end-question-answer]"#,
    },
];

static CONTINUATION_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: r#"[code]:
unsigned long fsize(char* file) {
    FILE f = fopen(file, "r");
    fseek(0, f, SEEK_END);
    long len = long(ftell(f));
    fclose(f);

    return len;
}
[question]: what's wrong with this code?"#,
        assistant: "[answer]: `f` must be a `FILE *` because that is what `fopen` returns, the first two arguments of `fseek` are swapped, and `long(...)` is not a valid cast in C.
[end-question-answer]",
    },
    SeedExchange {
        user: "[follow-up-question]: how can I use fseek and ftell properly?",
        assistant: r#"[answer]: `int fseek(FILE *stream, long offset, int whence)` moves the file position to `offset` bytes from `whence`, which is `SEEK_SET` (start of file), `SEEK_CUR` (current position), or `SEEK_END` (end of file). `long ftell(FILE *stream)` returns the current position in bytes from the start. Seeking to the end and calling `ftell` therefore gives the file size, and seeking back to `SEEK_SET` lets you read from the beginning again:
[code]:
[code-title]: measure and read a file with fseek and ftell
#include <stdio.h>
#include <stdlib.h>

int main(void) {
    FILE *f = fopen("test.txt", "rb");
    if (f == NULL) {
        return 1;
    }
    fseek(f, 0, SEEK_END);
    long len = ftell(f);
    fseek(f, 0, SEEK_SET);

    char *buf = malloc(len + 1);
    fread(buf, 1, len, f);
    buf[len] = '\0';
    fclose(f);

    printf("%s", buf);
    free(buf);
    return 0;
}
[end-code]
[end-question-answer]"#,
    },
];
