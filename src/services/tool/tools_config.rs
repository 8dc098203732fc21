// 内置工具定义表
//
// 声明顺序即 `AdapterRegistry::all()` 的顺序：先包管理器，后开发工具。

use crate::models::{Mirror, TieredConfigProfile, TieredKey, ToolCategory, ToolDescriptor};

const NPMMIRROR: Mirror = Mirror {
    name: "npmmirror",
    display_name: "阿里云（npmmirror）",
    url: "https://registry.npmmirror.com",
    location: "中国·杭州",
    homepage: Some("https://npmmirror.com"),
};

const TENCENT_NPM: Mirror = Mirror {
    name: "tencent",
    display_name: "腾讯云",
    url: "https://mirrors.cloud.tencent.com/npm",
    location: "中国·深圳",
    homepage: None,
};

const HUAWEI_NPM: Mirror = Mirror {
    name: "huawei",
    display_name: "华为云",
    url: "https://mirrors.huaweicloud.com/repository/npm",
    location: "中国·深圳",
    homepage: None,
};

const NPMJS: Mirror = Mirror {
    name: "npmjs",
    display_name: "npm 官方",
    url: "https://registry.npmjs.org",
    location: "美国",
    homepage: None,
};

const YARNPKG: Mirror = Mirror {
    name: "yarnpkg",
    display_name: "Yarn 官方",
    url: "https://registry.yarnpkg.com",
    location: "美国",
    homepage: None,
};

const PIP_MIRRORS: &[Mirror] = &[
    Mirror {
        name: "tuna",
        display_name: "清华大学",
        url: "https://pypi.tuna.tsinghua.edu.cn/simple",
        location: "中国·北京",
        homepage: Some("https://mirrors.tuna.tsinghua.edu.cn/help/pypi/"),
    },
    Mirror {
        name: "aliyun",
        display_name: "阿里云",
        url: "https://mirrors.aliyun.com/pypi/simple",
        location: "中国·杭州",
        homepage: None,
    },
    Mirror {
        name: "tencent",
        display_name: "腾讯云",
        url: "https://mirrors.cloud.tencent.com/pypi/simple",
        location: "中国·深圳",
        homepage: None,
    },
    Mirror {
        name: "douban",
        display_name: "豆瓣",
        url: "https://pypi.doubanio.com/simple",
        location: "中国·北京",
        homepage: None,
    },
    Mirror {
        name: "pypi",
        display_name: "PyPI 官方",
        url: "https://pypi.org/simple",
        location: "美国",
        homepage: None,
    },
];

const ALIYUN_MAVEN: Mirror = Mirror {
    name: "aliyun",
    display_name: "阿里云",
    url: "https://maven.aliyun.com/repository/public",
    location: "中国·杭州",
    homepage: None,
};

const MAVEN_MIRRORS: &[Mirror] = &[
    ALIYUN_MAVEN,
    Mirror {
        name: "tencent",
        display_name: "腾讯云",
        url: "https://mirrors.cloud.tencent.com/nexus/repository/maven-public",
        location: "中国·深圳",
        homepage: None,
    },
    Mirror {
        name: "huawei",
        display_name: "华为云",
        url: "https://mirrors.huaweicloud.com/repository/maven",
        location: "中国·深圳",
        homepage: None,
    },
    Mirror {
        name: "central",
        display_name: "Maven Central",
        url: "https://repo.maven.apache.org/maven2",
        location: "美国",
        homepage: None,
    },
];

const GRADLE_MIRRORS: &[Mirror] = &[
    ALIYUN_MAVEN,
    Mirror {
        name: "gradle",
        display_name: "Gradle 官方",
        url: "https://services.gradle.org/distributions",
        location: "美国",
        homepage: None,
    },
];

/// npm 的分层配置
///
/// npm 会把 `npm_config_*` 环境变量当作最高优先级配置，静默覆盖 user/global 配置文件。
pub static NPM_TIERS: TieredConfigProfile = TieredConfigProfile {
    binary: "npm",
    get_args: &["config", "get"],
    set_args: &["config", "set"],
    delete_args: &["config", "delete"],
    user_scope: "--location=user",
    global_scope: "--location=global",
    env_prefix: "npm_config_",
    keys: &[
        TieredKey {
            name: "registry",
            defaults: &["https://registry.npmjs.org/", "https://registry.npmjs.org"],
        },
        TieredKey {
            name: "proxy",
            defaults: &["null", "", "undefined"],
        },
        TieredKey {
            name: "https-proxy",
            defaults: &["null", "", "undefined"],
        },
        TieredKey {
            name: "cache",
            defaults: &[],
        },
        TieredKey {
            name: "prefix",
            defaults: &[],
        },
    ],
};

/// 所有内置工具
pub static BUILTIN_TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        id: "npm",
        display_name: "npm",
        category: ToolCategory::PackageManager,
        description: "Node.js 包管理器",
        check_cmd: &["npm", "--version"],
        enable_cmds: &[
            &["npm", "config", "set", "proxy", "{proxy}"],
            &["npm", "config", "set", "https-proxy", "{proxy}"],
        ],
        disable_cmds: &[
            &["npm", "config", "delete", "proxy"],
            &["npm", "config", "delete", "https-proxy"],
        ],
        get_proxy_cmd: Some(&["npm", "config", "get", "proxy"]),
        get_registry_cmd: Some(&["npm", "config", "get", "registry"]),
        set_registry_cmd: Some(&["npm", "config", "set", "registry", "{registry}"]),
        get_cache_dir_cmd: Some(&["npm", "config", "get", "cache"]),
        set_cache_dir_cmd: Some(&["npm", "config", "set", "cache", "{cache_dir}"]),
        cache_path_cmd: Some(&["npm", "config", "get", "cache"]),
        clean_cache_cmds: &[
            &["npm", "cache", "clean", "--force"],
            &["npm", "cache", "verify"],
        ],
        mirrors: &[NPMMIRROR, TENCENT_NPM, HUAWEI_NPM, NPMJS],
        benign_exit_codes: &[],
        tiers: Some(&NPM_TIERS),
    },
    ToolDescriptor {
        id: "yarn",
        display_name: "Yarn",
        category: ToolCategory::PackageManager,
        description: "快速、可靠、安全的 Node.js 包管理器",
        check_cmd: &["yarn", "--version"],
        enable_cmds: &[
            &["yarn", "config", "set", "proxy", "{proxy}"],
            &["yarn", "config", "set", "https-proxy", "{proxy}"],
        ],
        disable_cmds: &[
            &["yarn", "config", "delete", "proxy"],
            &["yarn", "config", "delete", "https-proxy"],
        ],
        get_proxy_cmd: Some(&["yarn", "config", "get", "proxy"]),
        get_registry_cmd: Some(&["yarn", "config", "get", "registry"]),
        set_registry_cmd: Some(&["yarn", "config", "set", "registry", "{registry}"]),
        get_cache_dir_cmd: Some(&["yarn", "config", "get", "cache-folder"]),
        set_cache_dir_cmd: Some(&["yarn", "config", "set", "cache-folder", "{cache_dir}"]),
        cache_path_cmd: Some(&["yarn", "cache", "dir"]),
        clean_cache_cmds: &[&["yarn", "cache", "clean"]],
        mirrors: &[NPMMIRROR, TENCENT_NPM, YARNPKG],
        benign_exit_codes: &[],
        tiers: None,
    },
    ToolDescriptor {
        id: "pnpm",
        display_name: "pnpm",
        category: ToolCategory::PackageManager,
        description: "快速的 Node.js 包管理器",
        check_cmd: &["pnpm", "--version"],
        enable_cmds: &[
            &["pnpm", "config", "set", "proxy", "{proxy}"],
            &["pnpm", "config", "set", "https-proxy", "{proxy}"],
        ],
        disable_cmds: &[
            &["pnpm", "config", "delete", "proxy"],
            &["pnpm", "config", "delete", "https-proxy"],
        ],
        get_proxy_cmd: Some(&["pnpm", "config", "get", "proxy"]),
        get_registry_cmd: Some(&["pnpm", "config", "get", "registry"]),
        set_registry_cmd: Some(&["pnpm", "config", "set", "registry", "{registry}"]),
        get_cache_dir_cmd: Some(&["pnpm", "config", "get", "store-dir"]),
        set_cache_dir_cmd: Some(&["pnpm", "config", "set", "store-dir", "{cache_dir}"]),
        cache_path_cmd: Some(&["pnpm", "store", "path"]),
        clean_cache_cmds: &[&["pnpm", "store", "prune"]],
        mirrors: &[NPMMIRROR, TENCENT_NPM, NPMJS],
        benign_exit_codes: &[],
        tiers: None,
    },
    ToolDescriptor {
        id: "bun",
        display_name: "Bun",
        category: ToolCategory::PackageManager,
        description: "极速 JavaScript 运行时和包管理器",
        check_cmd: &["bun", "--version"],
        enable_cmds: &[
            &["bun", "pm", "config", "set", "httpProxy", "{proxy}", "--global"],
            &["bun", "pm", "config", "set", "httpsProxy", "{proxy}", "--global"],
        ],
        disable_cmds: &[
            &["bun", "pm", "config", "rm", "httpProxy", "--global"],
            &["bun", "pm", "config", "rm", "httpsProxy", "--global"],
        ],
        get_proxy_cmd: Some(&["bun", "pm", "config", "get", "httpProxy", "--global"]),
        get_registry_cmd: Some(&["bun", "pm", "config", "get", "registry"]),
        set_registry_cmd: Some(&["bun", "pm", "config", "set", "registry", "{registry}"]),
        get_cache_dir_cmd: None,
        set_cache_dir_cmd: None,
        cache_path_cmd: None,
        clean_cache_cmds: &[],
        mirrors: &[],
        benign_exit_codes: &[1],
        tiers: None,
    },
    ToolDescriptor {
        id: "pip",
        display_name: "pip",
        category: ToolCategory::PackageManager,
        description: "Python 包管理器",
        check_cmd: &["pip", "--version"],
        enable_cmds: &[&["pip", "config", "set", "global.proxy", "{proxy}"]],
        disable_cmds: &[&["pip", "config", "unset", "global.proxy"]],
        get_proxy_cmd: Some(&["pip", "config", "get", "global.proxy"]),
        get_registry_cmd: Some(&["pip", "config", "get", "global.index-url"]),
        set_registry_cmd: Some(&["pip", "config", "set", "global.index-url", "{registry}"]),
        get_cache_dir_cmd: Some(&["pip", "config", "get", "global.cache-dir"]),
        set_cache_dir_cmd: Some(&["pip", "config", "set", "global.cache-dir", "{cache_dir}"]),
        cache_path_cmd: Some(&["pip", "cache", "dir"]),
        clean_cache_cmds: &[&["pip", "cache", "purge"]],
        mirrors: PIP_MIRRORS,
        // `pip config get/unset` 在键不存在时返回 1
        benign_exit_codes: &[1],
        tiers: None,
    },
    ToolDescriptor {
        id: "git",
        display_name: "Git",
        category: ToolCategory::DevTool,
        description: "分布式版本控制系统",
        check_cmd: &["git", "--version"],
        enable_cmds: &[
            &["git", "config", "--global", "http.proxy", "{proxy}"],
            &["git", "config", "--global", "https.proxy", "{proxy}"],
        ],
        disable_cmds: &[
            &["git", "config", "--global", "--unset", "http.proxy"],
            &["git", "config", "--global", "--unset", "https.proxy"],
        ],
        get_proxy_cmd: Some(&["git", "config", "--global", "http.proxy"]),
        get_registry_cmd: None,
        set_registry_cmd: None,
        get_cache_dir_cmd: None,
        set_cache_dir_cmd: None,
        cache_path_cmd: None,
        clean_cache_cmds: &[],
        mirrors: &[],
        // 读取不存在的键返回 1，`--unset` 不存在的键返回 5
        benign_exit_codes: &[1, 5],
        tiers: None,
    },
    ToolDescriptor {
        id: "maven",
        display_name: "Maven",
        category: ToolCategory::DevTool,
        description: "Java 项目管理和构建工具",
        check_cmd: &["mvn", "--version"],
        enable_cmds: &[],
        disable_cmds: &[],
        get_proxy_cmd: None,
        get_registry_cmd: None,
        set_registry_cmd: None,
        get_cache_dir_cmd: None,
        set_cache_dir_cmd: None,
        cache_path_cmd: None,
        clean_cache_cmds: &[],
        mirrors: MAVEN_MIRRORS,
        benign_exit_codes: &[],
        tiers: None,
    },
    ToolDescriptor {
        id: "gradle",
        display_name: "Gradle",
        category: ToolCategory::DevTool,
        description: "基于 Groovy 的构建工具",
        check_cmd: &["gradle", "--version"],
        enable_cmds: &[],
        disable_cmds: &[],
        get_proxy_cmd: None,
        get_registry_cmd: None,
        set_registry_cmd: None,
        get_cache_dir_cmd: None,
        set_cache_dir_cmd: None,
        cache_path_cmd: None,
        clean_cache_cmds: &[],
        mirrors: GRADLE_MIRRORS,
        benign_exit_codes: &[],
        tiers: None,
    },
    ToolDescriptor {
        id: "curl",
        display_name: "cURL",
        category: ToolCategory::DevTool,
        description: "命令行数据传输工具",
        check_cmd: &["curl", "--version"],
        enable_cmds: &[],
        disable_cmds: &[],
        get_proxy_cmd: None,
        get_registry_cmd: None,
        set_registry_cmd: None,
        get_cache_dir_cmd: None,
        set_cache_dir_cmd: None,
        cache_path_cmd: None,
        clean_cache_cmds: &[],
        mirrors: &[],
        benign_exit_codes: &[],
        tiers: None,
    },
    ToolDescriptor {
        id: "wget",
        display_name: "Wget",
        category: ToolCategory::DevTool,
        description: "网络文件下载工具",
        check_cmd: &["wget", "--version"],
        enable_cmds: &[],
        disable_cmds: &[],
        get_proxy_cmd: None,
        get_registry_cmd: None,
        set_registry_cmd: None,
        get_cache_dir_cmd: None,
        set_cache_dir_cmd: None,
        cache_path_cmd: None,
        clean_cache_cmds: &[],
        mirrors: &[],
        benign_exit_codes: &[],
        tiers: None,
    },
];

/// 按 ID 查找内置工具定义
pub fn find_tool(id: &str) -> Option<&'static ToolDescriptor> {
    BUILTIN_TOOLS.iter().find(|tool| tool.id == id)
}
