use super::{ModeTemplate, QuestionTemplate, SeedExchange};
use crate::tags::STOP_QUESTION_ANSWER;

pub(super) static TEMPLATE: QuestionTemplate = QuestionTemplate {
    question_type: tutor_core::types::QuestionType::GeneralQuestion,
    fresh: ModeTemplate {
        instruction: "For each asked [question], provide a thorough [answer] (single paragraph). \
To display multi-line code, start it with the [code]: tag, follow it with a [code-title]: line, \
and end it with [end-code]. Each response must end with [STOP-end-question-answer-STOP].",
        seeds: FRESH_SEEDS,
        stop: STOP_QUESTION_ANSWER,
        temperature: 0.05,
    },
    continuation: ModeTemplate {
        instruction: "For each asked [question] or [follow-up-question], provide a thorough [answer] \
(single paragraph). The [answer] must not contain multi-line code; instead start multi-line code \
with the [code]: tag, follow it with a [code-title]: line, and end it with [end-code]. Each \
response must end with [STOP-end-question-answer-STOP].",
        seeds: CONTINUATION_SEEDS,
        stop: STOP_QUESTION_ANSWER,
        temperature: 0.15,
    },
    max_tokens: 2048,
};

static FRESH_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: "[question]: what is the meaning of life?",
        assistant: "[answer]: Sorry, this is an irrelevant question. Please ask questions related to programming.
[STOP-end-question-answer-STOP]",
    },
    SeedExchange {
        user: "[question]: how can I read from a file?",
        assistant: r#"[answer]: Open the file with `fopen()`, which takes the file name and a mode string (`"r"` to read, `"w"` to write, `"a"` to append, `"r+"` or `"w+"` to read and write) and returns a `FILE *`, or `NULL` if the file could not be opened. Read it line by line with `fgets()`, which takes a character buffer, the buffer size, and the file pointer, and returns `NULL` once there is nothing left to read, so it fits naturally as a `while` condition. Close the file with `fclose()` when you are done.
[code]:
[code-title]: read a file line by line with fgets
FILE *file = fopen("file.txt", "r");
char line[100];

if (file != NULL) {
    while (fgets(line, sizeof(line), file)) {
        printf("%s", line);
    }
    fclose(file);
}
[end-code]
[STOP-end-question-answer-STOP]"#,
    },
    SeedExchange {
        user: "[question]: is it possible to initialize a boolean and reassign its value later in a program?",
        assistant: r#"[answer]: Yes. C has no boolean keyword before C99, but since C99 the `<stdbool.h>` header provides `bool`, `true`, and `false` (built on the `_Bool` type). A `bool` variable behaves like any other variable: initialize it once and assign a new value whenever needed. In older code the same effect is achieved with an `int` holding 0 for false and 1 for true.
[code]:
[code-title]: initialize a boolean and reassign it
#include <stdbool.h>
#include <stdio.h>

int main(void) {
    bool done = false;
    done = true;
    printf("%d\n", done);
    return 0;
}
[end-code]
[STOP-end-question-answer-STOP]"#,
    },
];

static CONTINUATION_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: "[question]: how can I read from a file?",
        assistant: r#"[answer]: Open the file with `fopen()`, which returns a `FILE *` for the given file name and mode (`"r"` for reading). Read one line at a time with `fgets()`, passing a buffer, its size, and the file pointer; it returns `NULL` at end of file, so it can drive a `while` loop. Close the file with `fclose()` when you are done.
[STOP-end-question-answer-STOP]"#,
    },
    SeedExchange {
        user: "[follow-up-question]: I don't want to use fgets, is there another way to read a file?",
        assistant: r#"[answer]: Yes, there are several: `getc(fp)` reads a single character and returns it as an `int` (or `EOF` at the end), `fscanf(fp, "%d %s", &n, word)` reads formatted values much like `scanf`, and `fread(ptr, size, count, fp)` reads a block of `count` items of `size` bytes into memory at `ptr`. Here is how to read formatted values with `fscanf()`:
[code]:
[code-title]: read formatted values with fscanf
FILE *file = fopen("file.txt", "r");
int id;
char name[100];
float score;

if (file != NULL) {
    while (fscanf(file, "%d %99s %f", &id, name, &score) == 3) {
        printf("%d %s %.1f\n", id, name, score);
    }
    fclose(file);
}
[end-code]
[STOP-end-question-answer-STOP]"#,
    },
];
