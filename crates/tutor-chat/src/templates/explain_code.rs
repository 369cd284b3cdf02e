use super::{ModeTemplate, QuestionTemplate, SeedExchange};
use crate::tags::{STOP_EXPLAIN_CODE, STOP_QUESTION_ANSWER};
use tutor_core::types::QuestionType;

pub(super) static TEMPLATE: QuestionTemplate = QuestionTemplate {
    question_type: QuestionType::CodeExplanation,
    fresh: ModeTemplate {
        instruction: "Provide a clear [explanation]: of the given [code]'s purpose and behavior, then \
show the [annotated-code]: with detailed line-by-line comments explaining what each part does, \
ending it with [end-annotated-code]. Focus on C/C++ concepts, syntax, and good practice. Each \
response must end with [STOP-end-explain-code-STOP].",
        seeds: FRESH_SEEDS,
        stop: STOP_EXPLAIN_CODE,
        temperature: 0.1,
    },
    continuation: ModeTemplate {
        instruction: "Answer [follow-up-question]s about the previously explained and annotated code \
with an [answer]: that helps the student understand the C/C++ concepts involved. When an example \
helps, add a [code]: block with a [code-title]: line, ending it with [end-code]. Each response \
must end with [STOP-end-question-answer-STOP].",
        seeds: CONTINUATION_SEEDS,
        stop: STOP_QUESTION_ANSWER,
        temperature: 0.15,
    },
    max_tokens: 1536,
};

static FRESH_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: "[code]:
print(\"hello from another language\")
[question]: Explain the code",
        assistant: "[answer]: Sorry, I can only provide code examples in C or C++ programming languages.
[STOP-end-explain-code-STOP]",
    },
    SeedExchange {
        user: r#"[code]:
#include <stdlib.h>
#include <string.h>
#include <unistd.h>

void write_random_pieces(int soc, const char *message, int times) {
    char piece[MAXCHARS];
    int message_len = strlen(message);
    int total_bytes = times * message_len;
    int current_byte = 0;

    while (current_byte < total_bytes) {
        int piece_size = rand() % (MAXCHARS - MINCHARS + 1) + MINCHARS;
        int bytes_left = total_bytes - current_byte;
        if (piece_size > bytes_left) {
            piece_size = bytes_left;
        }

        for (int i = 0; i < piece_size; i++) {
            piece[i] = message[(current_byte + i) % message_len];
        }
        write(soc, piece, piece_size);
        current_byte += piece_size;
    }
}"#,
        assistant: r#"[explanation]: The function sends `message` over the socket `soc` a total of `times` times, but deliberately splits the stream into pieces of random length between `MINCHARS` and `MAXCHARS`. It tracks how many bytes have been sent, shrinks the last piece so that exactly `times * strlen(message)` bytes go out, and uses modulo arithmetic to wrap around to the start of the message when a piece crosses its end. This is a typical way to test that a receiver correctly reassembles messages that arrive in arbitrary chunks.
[annotated-code]:
#include <stdlib.h> // rand()
#include <string.h> // strlen()
#include <unistd.h> // write()

void write_random_pieces(int soc, const char *message, int times) { // socket, message, repeat count
    char piece[MAXCHARS]; // buffer for one piece, sized for the largest possible piece
    int message_len = strlen(message); // length of one copy of the message
    int total_bytes = times * message_len; // bytes to send in total
    int current_byte = 0; // bytes sent so far

    while (current_byte < total_bytes) { // keep going until everything is sent
        int piece_size = rand() % (MAXCHARS - MINCHARS + 1) + MINCHARS; // random size in [MINCHARS, MAXCHARS]
        int bytes_left = total_bytes - current_byte; // what remains to be sent
        if (piece_size > bytes_left) { // never send more than what remains
            piece_size = bytes_left;
        }

        for (int i = 0; i < piece_size; i++) { // fill the piece
            piece[i] = message[(current_byte + i) % message_len]; // wrap around the message with modulo
        }
        write(soc, piece, piece_size); // send the piece
        current_byte += piece_size; // advance the sent counter
    }
}
[end-annotated-code]
[STOP-end-explain-code-STOP]"#,
    },
];

static CONTINUATION_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: r#"[code]:
void read_bitmap_metadata(FILE *image, int *pixel_array_offset, int *width, int *height) {
    fseek(image, 10, SEEK_SET); // jump to byte 10 of the file
    fread(pixel_array_offset, 4, 1, image); // read the 4-byte pixel array offset
    fseek(image, 18, SEEK_SET); // jump to byte 18 of the file
    fread(width, 4, 1, image); // read the 4-byte width
    fread(height, 4, 1, image); // read the 4-byte height that follows
}
[question]: what does SEEK_SET do?"#,
        assistant: "[answer]: `SEEK_SET` is a constant from `<stdio.h>` that tells `fseek()` to measure the offset from the beginning of the file. In this function it makes `fseek(image, 10, SEEK_SET)` and `fseek(image, 18, SEEK_SET)` jump to absolute byte positions 10 and 18, where the bitmap header stores the pixel array offset and the image dimensions.
[STOP-end-question-answer-STOP]",
    },
    SeedExchange {
        user: "[follow-up-question]: show me different ways to use fseek() to move the file position",
        assistant: r#"[answer]: `fseek()` accepts three origins: `SEEK_SET` measures from the start of the file, `SEEK_CUR` from the current position (so negative offsets move backwards), and `SEEK_END` from the end of the file. Combined with `ftell()`, which reports the current position, they let you skip, rewind, or measure a file:
[code]:
[code-title]: the three fseek origins
#include <stdio.h>

int main(void) {
    FILE *f = fopen("test.bin", "rb");
    if (f == NULL) {
        return 1;
    }
    fseek(f, 0, SEEK_END); // end of file
    long size = ftell(f);
    fseek(f, 10, SEEK_SET); // byte 10 from the start
    fseek(f, -4, SEEK_CUR); // back 4 bytes, now at byte 6
    printf("size %ld, position %ld\n", size, ftell(f));
    fclose(f);
    return 0;
}
[end-code]
[STOP-end-question-answer-STOP]"#,
    },
];
