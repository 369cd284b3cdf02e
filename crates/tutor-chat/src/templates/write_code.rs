use super::{ModeTemplate, QuestionTemplate, SeedExchange};
use crate::tags::STOP_QUESTION_ANSWER;
use tutor_core::types::QuestionType;

pub(super) static TEMPLATE: QuestionTemplate = QuestionTemplate {
    question_type: QuestionType::HelpWriteCode,
    fresh: ModeTemplate {
        instruction: "Focus on implementing C/C++ code. For each [question], first give a high-level \
[answer]: describing the approach, then the implementation in a [code]: block, with a \
[code-title]: line before each part, ending with [end-code]. Each response must end with \
[STOP-end-question-answer-STOP].",
        seeds: FRESH_SEEDS,
        stop: STOP_QUESTION_ANSWER,
        temperature: 0.1,
    },
    continuation: ModeTemplate {
        instruction: "Focus on implementing C/C++ code that builds on the code already written in \
this conversation. For each [follow-up-question], first give a high-level [answer]: describing \
the approach, then the implementation in a [code]: block, with a [code-title]: line before each \
part, ending with [end-code]. Each response must end with [STOP-end-question-answer-STOP].",
        seeds: CONTINUATION_SEEDS,
        stop: STOP_QUESTION_ANSWER,
        temperature: 0.1,
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
        user: "[question]: the fib function generates the first n values in the Fibonacci sequence, stores them in a dynamically-allocated array, and returns them through a pointer parameter passed as the first argument. call fib using argc and argv in the main function.",
        assistant: r#"[answer]: `fib` takes a pointer to the caller's array pointer and the number of values to generate. It allocates room for `n` integers with `malloc`, stores the address through the pointer parameter, writes the first two values (0 and 1) when there is room for them, and fills the rest in a loop where each value is the sum of the two before it. `main` converts `argv[1]` to an integer, calls `fib`, prints the values, and frees the array.
[code]:
[code-title]: define the function
void fib(int **arr, int n) {
    *arr = malloc(n * sizeof(int));

    if (n > 0) {
        (*arr)[0] = 0;
    }
    if (n > 1) {
        (*arr)[1] = 1;
    }
    for (int i = 2; i < n; i++) {
        (*arr)[i] = (*arr)[i - 1] + (*arr)[i - 2];
    }
}

[code-title]: call the function in main using argc and argv
int main(int argc, char *argv[]) {
    if (argc < 2) {
        return 1;
    }
    int n = atoi(argv[1]);
    int *arr;
    fib(&arr, n);
    for (int i = 0; i < n; i++) {
        printf("%d ", arr[i]);
    }
    free(arr);
    return 0;
}
[end-code]
[STOP-end-question-answer-STOP]"#,
    },
];

static CONTINUATION_SEEDS: &[SeedExchange] = &[
    SeedExchange {
        user: "[question]: a linked list using structs",
        assistant: r#"[answer]: A linked list is a chain of nodes where each node is a `struct` holding the data and a pointer to the next node. The list is reached through a `head` pointer that starts out `NULL`. Adding to the end means allocating a node with `malloc`, filling in its fields, and either making it the head (for an empty list) or walking to the last node and linking the new node after it.
[code]:
[code-title]: the node structure
struct node {
    int data;
    struct node *next;
};

[code-title]: append a value to the end of the list
void append(struct node **head, int value) {
    struct node *new_node = malloc(sizeof(struct node));
    new_node->data = value;
    new_node->next = NULL;

    if (*head == NULL) {
        *head = new_node;
        return;
    }
    struct node *current = *head;
    while (current->next != NULL) {
        current = current->next;
    }
    current->next = new_node;
}
[end-code]
[STOP-end-question-answer-STOP]"#,
    },
    SeedExchange {
        user: "[follow-up-question]: write a function that takes an array of integers and returns a linked list of the same integers.",
        assistant: r#"[answer]: Walk the array once, allocating a node per element. Keeping a pointer to the last node avoids rescanning the list for every append, so the whole conversion is linear in the array length.
[code]:
[code-title]: build a list from an array
struct node *listify(const int *arr, int n) {
    struct node *head = NULL;
    struct node *tail = NULL;

    for (int i = 0; i < n; i++) {
        struct node *new_node = malloc(sizeof(struct node));
        new_node->data = arr[i];
        new_node->next = NULL;

        if (head == NULL) {
            head = new_node;
        } else {
            tail->next = new_node;
        }
        tail = new_node;
    }
    return head;
}

[code-title]: call it from main
int main(void) {
    int values[] = {1, 2, 3, 4, 5};
    struct node *head = listify(values, 5);
    for (struct node *current = head; current != NULL; current = current->next) {
        printf("%d ", current->data);
    }
    return 0;
}
[end-code]
[STOP-end-question-answer-STOP]"#,
    },
];
